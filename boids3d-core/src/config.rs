//! Settings validation and the wrap-around volume derived from them.

use boids3d_shared::FlockSettings;

use crate::error::FlockError;
use crate::math::Vector3;

/// Axis-aligned wrap-around volume centred on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3,
    pub max: Vector3,
}

impl Bounds {
    /// `min = -constraints / 2` on every axis, `max = -min`.
    pub fn from_constraints(constraints: f32) -> Self {
        let min = Vector3::splat(constraints / -2.0);
        Self { min, max: -min }
    }

    /// True when `point` lies strictly inside the volume on every axis
    pub fn contains(&self, point: Vector3) -> bool {
        self.min.x < point.x
            && point.x < self.max.x
            && self.min.y < point.y
            && point.y < self.max.y
            && self.min.z < point.z
            && point.z < self.max.z
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), FlockError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FlockError::config(field, "must be a finite number", value))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), FlockError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(FlockError::config(field, "must not be negative", value));
    }
    Ok(())
}

fn finite_vec(field: &'static str, values: [f32; 3]) -> Result<(), FlockError> {
    values.into_iter().try_for_each(|v| finite(field, v))
}

/// Rejects settings the simulation cannot run with. Values are never
/// clamped.
pub fn validate(settings: &FlockSettings) -> Result<(), FlockError> {
    finite("constraints", settings.constraints)?;
    if settings.constraints <= 0.0 {
        return Err(FlockError::config(
            "constraints",
            "must be greater than zero",
            settings.constraints,
        ));
    }

    non_negative("spawn_radius", settings.spawn_radius)?;
    non_negative("speed", settings.speed)?;

    let anchor = settings.anchor_position;
    finite_vec("anchor_position", [anchor.x, anchor.y, anchor.z])?;
    let rotation = settings.anchor_rotation;
    finite_vec(
        "anchor_rotation",
        [rotation.pitch, rotation.yaw, rotation.roll],
    )?;

    non_negative("wander_threshold", settings.wander_threshold)?;
    non_negative("wander_distance", settings.wander_distance)?;
    non_negative("wander_jitter", settings.wander_jitter)?;
    non_negative(
        "wander_destination_threshold",
        settings.wander_destination_threshold,
    )?;

    non_negative("max_flee_distance", settings.max_flee_distance)?;
    finite("chaser_multiplier", settings.chaser_multiplier)?;
    non_negative("catch_range", settings.catch_range)?;
    non_negative("time_out_duration", settings.time_out_duration)?;

    non_negative("neighbour_radius", settings.neighbour_radius)?;
    finite("separation_weight", settings.separation_weight)?;
    finite("cohesion_weight", settings.cohesion_weight)?;
    finite("alignment_weight", settings.alignment_weight)?;
    non_negative("cohesion_threshold", settings.cohesion_threshold)?;
    non_negative("alignment_threshold", settings.alignment_threshold)?;

    Ok(())
}
