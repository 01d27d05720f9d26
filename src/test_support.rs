//! Hand-built terrain for unit tests.

use bevy::prelude::*;

use crate::backend::TerrainQuery;
use crate::detection::{Platform, SurfaceHit};

/// Allocate `count` distinct entities.
pub(crate) fn entities(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum MockShape {
    /// Axis-aligned box.
    Aabb { min: Vec2, max: Vec2 },
    /// Solid half-plane below the line through `point` with outward `normal`.
    HalfPlane { point: Vec2, normal: Vec2 },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MockSolid {
    pub shape: MockShape,
    pub entity: Entity,
    pub velocity: Vec2,
    pub platform: Option<Platform>,
}

/// A tiny analytic world: boxes and half-planes.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTerrain {
    pub solids: Vec<MockSolid>,
    pub excluded: Vec<Entity>,
}

impl MockTerrain {
    pub fn with_box(mut self, entity: Entity, center: Vec2, half: Vec2) -> Self {
        self.solids.push(MockSolid {
            shape: MockShape::Aabb {
                min: center - half,
                max: center + half,
            },
            entity,
            velocity: Vec2::ZERO,
            platform: None,
        });
        self
    }

    pub fn with_slope(mut self, entity: Entity, point: Vec2, normal: Vec2) -> Self {
        self.solids.push(MockSolid {
            shape: MockShape::HalfPlane {
                point,
                normal: normal.normalize(),
            },
            entity,
            velocity: Vec2::ZERO,
            platform: None,
        });
        self
    }

    /// Tag the most recently added solid.
    pub fn tagged(mut self, platform: Platform, velocity: Vec2) -> Self {
        if let Some(solid) = self.solids.last_mut() {
            solid.platform = Some(platform);
            solid.velocity = velocity;
        }
        self
    }

    pub fn excluding(&self, entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut terrain = self.clone();
        terrain.excluded.extend(entities);
        terrain
    }

    fn closest(
        &self,
        mut hit_solid: impl FnMut(&MockSolid) -> Option<(f32, Vec2, Vec2)>,
    ) -> Option<SurfaceHit> {
        self.solids
            .iter()
            .filter(|solid| !self.excluded.contains(&solid.entity))
            .filter_map(|solid| {
                hit_solid(solid)
                    .map(|(distance, normal, point)| SurfaceHit::new(distance, normal, point, solid.entity))
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn solid(&self, entity: Entity) -> Option<&MockSolid> {
        self.solids.iter().find(|solid| solid.entity == entity)
    }
}

fn ray_aabb(origin: Vec2, dir: Vec2, min: Vec2, max: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = max_distance;
    let mut normal = Vec2::ZERO;
    for axis in 0..2 {
        if dir[axis].abs() < 1e-8 {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir[axis];
        let mut t1 = (min[axis] - origin[axis]) * inv;
        let mut t2 = (max[axis] - origin[axis]) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_enter || (t1 == t_enter && normal == Vec2::ZERO) {
            t_enter = t1;
            normal = Vec2::AXES[axis] * -dir[axis].signum();
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }
    Some((t_enter, normal))
}

fn ray_half_plane(origin: Vec2, dir: Vec2, point: Vec2, normal: Vec2, max_distance: f32) -> Option<f32> {
    let height = normal.dot(origin - point);
    if height <= 0.0 {
        return Some(0.0);
    }
    let approach = normal.dot(dir);
    if approach >= 0.0 {
        return None;
    }
    let t = -height / approach;
    (t <= max_distance).then_some(t)
}

impl TerrainQuery for MockTerrain {
    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<SurfaceHit> {
        let dir = *direction;
        self.closest(|solid| match solid.shape {
            MockShape::Aabb { min, max } => ray_aabb(origin, dir, min, max, max_distance)
                .map(|(t, normal)| (t, normal, origin + dir * t)),
            MockShape::HalfPlane { point, normal } => {
                ray_half_plane(origin, dir, point, normal, max_distance)
                    .map(|t| (t, normal, origin + dir * t))
            }
        })
    }

    fn cast_box(
        &self,
        center: Vec2,
        half_extents: Vec2,
        direction: Dir2,
        max_distance: f32,
    ) -> Option<SurfaceHit> {
        let dir = *direction;
        self.closest(|solid| match solid.shape {
            MockShape::Aabb { min, max } => {
                ray_aabb(center, dir, min - half_extents, max + half_extents, max_distance)
                    .map(|(t, normal)| (t, normal, center + dir * t - normal * half_extents))
            }
            MockShape::HalfPlane { point, normal } => {
                let corner = center - half_extents * normal.signum();
                ray_half_plane(corner, dir, point, normal, max_distance)
                    .map(|t| (t, normal, corner + dir * t))
            }
        })
    }

    fn surface_velocity(&self, entity: Entity) -> Vec2 {
        self.solid(entity).map_or(Vec2::ZERO, |solid| solid.velocity)
    }

    fn platform(&self, entity: Entity) -> Option<Platform> {
        self.solid(entity).and_then(|solid| solid.platform)
    }
}
