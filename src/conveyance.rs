//! Platform conveyance and manual collision resolution.
//!
//! While a character rides a moving platform its body is positioned
//! directly, so the physics solver no longer resolves its contacts. Every
//! conveyed step the controller sweeps its own collision box along the
//! requested displacement and, on a blocking hit, snaps to the obstacle's
//! boundary instead of committing the move. The platform's motion over the
//! step is part of that displacement.

use bevy::prelude::*;

use crate::backend::TerrainQuery;
use crate::detection::SurfaceHit;
use crate::probe::ProbeShape;

/// Outcome of [`resolve_kinematic_move`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicMove {
    /// Body position to commit.
    pub position: Vec2,
    /// The blocking hit, if the requested displacement was discarded.
    pub hit: Option<SurfaceHit>,
}

impl KinematicMove {
    fn unobstructed(position: Vec2) -> Self {
        Self {
            position,
            hit: None,
        }
    }
}

/// Move a directly-positioned body by `displacement`, stopping at the first
/// blocking surface.
///
/// `query` must already exclude the platform being ridden, the character's
/// own colliders and sensors. `max_penetration` is the margin used to find
/// the obstacle boundary: the result never overlaps the obstacle and is at
/// most `max_penetration` away from it.
pub fn resolve_kinematic_move(
    query: &impl TerrainQuery,
    position: Vec2,
    shape: &ProbeShape,
    displacement: Vec2,
    max_penetration: f32,
) -> KinematicMove {
    let Ok(direction) = Dir2::new(displacement) else {
        return KinematicMove::unobstructed(position);
    };

    let center = shape.center(position);
    let half = shape.half_extents;
    let Some(hit) = query.cast_box(center, half, direction, displacement.length()) else {
        return KinematicMove::unobstructed(position + displacement);
    };

    let impact = center + *direction * hit.distance;
    let backoff = impact + hit.normal * max_penetration;
    let boundary = Dir2::new(-hit.normal)
        .ok()
        .and_then(|back| query.cast_box(backoff, half, back, max_penetration * 2.0));

    let resolved = match boundary {
        Some(boundary) => backoff - hit.normal * boundary.distance,
        None => {
            warn!(
                "conveyed move blocked by {:?} but the boundary cast found nothing; holding at impact",
                hit.entity
            );
            impact
        }
    };

    KinematicMove {
        position: resolved - shape.offset,
        hit: Some(hit),
    }
}
