//! A single boid: its own state and the steering rules it can compute
//! from what the manager tells it about the rest of the flock.

use core::fmt;

use boids3d_shared::{AgentState, FlockSettings};
use rand::Rng;

use crate::config::Bounds;
use crate::math::{random_scalar, Rotator, Vector3};

/// Stable handle for an agent, unique for the lifetime of its manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub(crate) u32);

impl AgentId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vector3,
    pub velocity: Vector3,
    /// Point the wander rule is heading for; kept until reached
    pub wander_target: Vector3,
    /// Last travel direction, used as forward when projecting wander targets
    pub heading: Vector3,
    pub rotation: Rotator,
    pub scale: Vector3,
}

impl Agent {
    pub fn new(id: AgentId, position: Vector3, rotation: Rotator) -> Self {
        Self {
            id,
            position,
            velocity: Vector3::ZERO,
            wander_target: Vector3::ZERO,
            heading: rotation.forward(),
            rotation,
            scale: Vector3::splat(1.0),
        }
    }

    /// Unit vector towards `target`
    pub fn seek(&self, target: Vector3) -> Vector3 {
        (target - self.position).normalize()
    }

    /// Unit vector away from `target`
    pub fn flee(&self, target: Vector3) -> Vector3 {
        (self.position - target).normalize()
    }

    /// Normalized average heading of the neighbors.
    pub fn alignment(&self, neighbors: &[&Agent]) -> Vector3 {
        if neighbors.is_empty() {
            return Vector3::ZERO;
        }
        let mut sum = Vector3::ZERO;
        for other in neighbors {
            sum += other.velocity;
        }
        (sum / neighbors.len() as f32).normalize()
    }

    /// Steer towards the neighbors' centre of mass.
    pub fn cohesion(&self, neighbors: &[&Agent]) -> Vector3 {
        if neighbors.is_empty() {
            return Vector3::ZERO;
        }
        let mut centre = Vector3::ZERO;
        for other in neighbors {
            centre += other.position;
        }
        self.seek(centre / neighbors.len() as f32)
    }

    /// Steer away from every neighbor at once.
    pub fn separation(&self, neighbors: &[&Agent]) -> Vector3 {
        if neighbors.is_empty() {
            return Vector3::ZERO;
        }
        let mut away = Vector3::ZERO;
        for other in neighbors {
            away += self.flee(other.position);
        }
        away.normalize()
    }

    /// Composite flocking velocity. Alignment and cohesion only contribute
    /// while the running total is still below their thresholds.
    pub fn flock_steering(&self, neighbors: &[&Agent], settings: &FlockSettings) -> Vector3 {
        let mut target = self.separation(neighbors) * settings.separation_weight;
        if target.length() < settings.alignment_threshold {
            target += self.alignment(neighbors) * settings.alignment_weight;
        }
        if target.length() < settings.cohesion_threshold {
            target += self.cohesion(neighbors) * settings.cohesion_weight;
        }
        target.normalize()
    }

    /// Chase `nearest` when tagged, otherwise run from it.
    pub fn tag_steering(
        &self,
        nearest: Vector3,
        is_tagged: bool,
        settings: &FlockSettings,
    ) -> Vector3 {
        if is_tagged {
            self.seek(nearest) * settings.chaser_multiplier
        } else {
            self.flee(nearest)
        }
    }

    /// Adds a jittered pull towards a persistent wander target when the
    /// requested velocity is weak. Returns `input` untouched otherwise.
    pub fn wander<R: Rng + ?Sized>(
        &mut self,
        input: Vector3,
        settings: &FlockSettings,
        rng: &mut R,
    ) -> Vector3 {
        if !settings.wander_enabled || input.length() >= settings.wander_threshold {
            return input;
        }

        if self.position.distance(&self.wander_target) < settings.wander_destination_threshold {
            let projected = self.position + self.heading * settings.wander_distance;
            self.wander_target = projected + jitter(settings.wander_jitter, rng);
        }

        let pull = self.seek(self.wander_target) + jitter(settings.wander_jitter, rng);
        (input + pull).normalize()
    }

    /// Steer the velocity towards `target` and advance the position.
    pub fn integrate(&mut self, target: Vector3, dt: f32, speed: f32) {
        let force = target - self.velocity;
        self.velocity += force * dt;
        self.position += self.velocity * speed * dt;
    }

    /// Teleport to the opposite face on every axis that left the volume.
    /// Each axis is judged on its own pre-wrap value.
    pub fn apply_boundary_wrap(&mut self, bounds: &Bounds) {
        let p = &mut self.position;
        p.x = wrap_axis(p.x, bounds.min.x, bounds.max.x);
        p.y = wrap_axis(p.y, bounds.min.y, bounds.max.y);
        p.z = wrap_axis(p.z, bounds.min.z, bounds.max.z);
    }

    /// Stretch along the depth axis with speed. Cosmetic only.
    pub fn apply_scale(&mut self) {
        self.scale = Vector3::new(1.0, 1.0, 2.0 * self.velocity.length() + 0.5);
    }

    pub fn apply_rotation(&mut self) {
        let direction = self.velocity.normalize();
        if !direction.is_zero() {
            self.heading = direction;
        }
        self.rotation = Rotator::facing(direction);
    }

    /// One movement step: wrap, scale, wander, rotate, integrate.
    ///
    /// Wrapping runs first so the wander decision sees the post-teleport
    /// position.
    pub fn move_with<R: Rng + ?Sized>(
        &mut self,
        target: Vector3,
        dt: f32,
        settings: &FlockSettings,
        bounds: &Bounds,
        rng: &mut R,
    ) {
        self.apply_boundary_wrap(bounds);
        self.apply_scale();
        let target = self.wander(target, settings, rng);
        self.apply_rotation();
        self.integrate(target, dt, settings.speed);
    }

    pub fn state(&self, tagged: bool) -> AgentState {
        AgentState {
            id: self.id.get(),
            position: self.position.into(),
            velocity: self.velocity.into(),
            rotation: self.rotation.into(),
            scale: self.scale.into(),
            tagged,
        }
    }
}

/// Lands one relative epsilon inside the opposite face so a wrapped
/// position is strictly inside and wrapping again leaves it alone.
fn wrap_axis(value: f32, min: f32, max: f32) -> f32 {
    if value <= min {
        max - max.abs() * f32::EPSILON
    } else if value >= max {
        min + min.abs() * f32::EPSILON
    } else {
        value
    }
}

fn jitter<R: Rng + ?Sized>(amount: f32, rng: &mut R) -> Vector3 {
    Vector3::random_unit(rng) * random_scalar(rng, 0.0, amount)
}
