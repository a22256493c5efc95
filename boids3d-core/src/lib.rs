//! Headless 3D boid simulation: steering rules, a wrap-around volume and a
//! tag-chase game, driven one frame at a time by a host loop.

pub mod agent;
pub mod config;
pub mod error;
pub mod manager;
pub mod math;

pub use agent::{Agent, AgentId};
pub use config::{validate, Bounds};
pub use error::FlockError;
pub use manager::{FlockManager, Nearest};
pub use math::{random_scalar, Rotator, Vector3, ASSET_PITCH_OFFSET};

pub use boids3d_shared::{AgentState, BehaviorMode, FlockSettings, FrameReport};
