use boids3d_shared::{Orientation, Vec3};
use rand::Rng;

/// Pitch added to every facing rotation so an asset modelled along +Z
/// (a cone pointing up) lines up with the direction of travel.
pub const ASSET_PITCH_OFFSET: f32 = -90.0;

/// A 3D vector used for position, velocity and steering
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Vector with the same value on every axis
    pub fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Euclidean length. `hypot` keeps large finite components from
    /// overflowing to infinity.
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y).hypot(self.z)
    }

    pub fn dot(&self, other: &Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self / len
        } else {
            Self::ZERO
        }
    }

    pub fn distance(&self, other: &Vector3) -> f32 {
        (*self - *other).length()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Uniformly distributed point on the unit sphere
    pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let z: f32 = rng.gen_range(-1.0..=1.0);
        let theta: f32 = rng.gen_range(0.0..core::f32::consts::TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        Self::new(r * theta.cos(), r * theta.sin(), z)
    }
}

/// Uniform value in `[min, max]`; collapses to `min` for an empty range.
pub fn random_scalar<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

impl core::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl core::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl core::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl core::ops::Mul<f32> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector3 {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Orientation as pitch/yaw/roll in degrees.
///
/// Yaw turns around +Z starting from +X, pitch lifts towards +Z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation whose forward axis points along `direction`.
    /// A zero direction gives the zero rotation.
    pub fn from_direction(direction: Vector3) -> Self {
        if direction.is_zero() {
            return Self::ZERO;
        }
        let yaw = direction.y.atan2(direction.x).to_degrees();
        let horizontal = direction.x.hypot(direction.y);
        let pitch = direction.z.atan2(horizontal).to_degrees();
        Self::new(pitch, yaw, 0.0)
    }

    /// Rotation for an agent asset travelling along `direction`
    pub fn facing(direction: Vector3) -> Self {
        let mut rotation = Self::from_direction(direction);
        rotation.pitch += ASSET_PITCH_OFFSET;
        rotation
    }

    /// Unit vector along this rotation's forward axis
    pub fn forward(&self) -> Vector3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vector3::new(cp * cy, cp * sy, sp)
    }
}

impl From<Orientation> for Rotator {
    fn from(o: Orientation) -> Self {
        Self::new(o.pitch, o.yaw, o.roll)
    }
}

impl From<Rotator> for Orientation {
    fn from(r: Rotator) -> Self {
        Orientation::new(r.pitch, r.yaw, r.roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_vector3_length() {
        let v = Vector3::new(2.0, 3.0, 6.0);
        assert_eq!(v.length(), 7.0);
    }

    #[test]
    fn test_vector3_operations() {
        let v1 = Vector3::new(1.0, 2.0, 3.0);
        let v2 = Vector3::new(4.0, 5.0, 6.0);

        assert_eq!(v1 + v2, Vector3::new(5.0, 7.0, 9.0));
        assert_eq!(v2 - v1, Vector3::new(3.0, 3.0, 3.0));
        assert_eq!(v1 * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(-v1, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(v2 / 2.0, Vector3::new(2.0, 2.5, 3.0));
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vector3::ZERO.normalize(), Vector3::ZERO);
    }

    #[test]
    fn test_normalize_unit_length() {
        let samples = [
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::new(-0.001, 0.0, 0.002),
            Vector3::new(1e4, -2e4, 3e4),
        ];
        for v in samples {
            assert!(approx(v.normalize().length(), 1.0));
        }
    }

    #[test]
    fn test_huge_vectors_stay_finite() {
        let v = Vector3::new(1e20, 1e20, 1e20);
        assert!(v.length().is_finite());
        assert!(approx(v.normalize().length(), 1.0));

        let a = Vector3::new(-2e19, 0.0, 0.0);
        let b = Vector3::new(2e19, 0.0, 0.0);
        assert_eq!(a.distance(&b), 4e19);
        assert_eq!((b - a).normalize(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_distance() {
        let a = Vector3::new(1.0, 1.0, 1.0);
        let b = Vector3::new(1.0, 4.0, 5.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_random_unit_is_unit() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(approx(Vector3::random_unit(&mut rng).length(), 1.0));
        }
    }

    #[test]
    fn test_random_scalar_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let value = random_scalar(&mut rng, 0.0, 2.5);
            assert!((0.0..=2.5).contains(&value));
        }
        assert_eq!(random_scalar(&mut rng, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_rotation_from_direction() {
        let up = Rotator::from_direction(Vector3::new(0.0, 0.0, 1.0));
        assert!(approx(up.pitch, 90.0));

        let left = Rotator::from_direction(Vector3::new(0.0, 1.0, 0.0));
        assert!(approx(left.yaw, 90.0));
        assert!(approx(left.pitch, 0.0));
    }

    #[test]
    fn test_facing_applies_asset_offset() {
        let facing = Rotator::facing(Vector3::new(1.0, 0.0, 0.0));
        assert!(approx(facing.pitch, ASSET_PITCH_OFFSET));
        assert!(approx(facing.yaw, 0.0));

        let still = Rotator::facing(Vector3::ZERO);
        assert_eq!(still, Rotator::new(ASSET_PITCH_OFFSET, 0.0, 0.0));
    }

    #[test]
    fn test_forward_inverts_from_direction() {
        let direction = Vector3::new(1.0, -2.0, 0.5).normalize();
        let forward = Rotator::from_direction(direction).forward();
        assert!(approx(forward.x, direction.x));
        assert!(approx(forward.y, direction.y));
        assert!(approx(forward.z, direction.z));
    }
}
