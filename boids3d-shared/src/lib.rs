use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A plain 3D coordinate as it crosses the simulation boundary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Facing orientation in degrees
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Which update path the manager runs every tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorMode {
    #[default]
    None,
    Tag,
    Flock,
}

impl fmt::Display for BehaviorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BehaviorMode::None => "none",
            BehaviorMode::Tag => "tag",
            BehaviorMode::Flock => "flock",
        };
        f.write_str(name)
    }
}

impl FromStr for BehaviorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(BehaviorMode::None),
            "tag" => Ok(BehaviorMode::Tag),
            "flock" => Ok(BehaviorMode::Flock),
            other => Err(format!(
                "unknown behavior mode '{}' (expected none, tag or flock)",
                other
            )),
        }
    }
}

/// Flock simulation configuration.
///
/// Every field has a default so partial JSON documents deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    pub behavior_mode: BehaviorMode,
    pub spawn_count: usize,
    pub spawn_radius: f32,
    /// Velocity to position scale
    pub speed: f32,
    /// Edge length of the wrap-around volume, centred on the origin
    pub constraints: f32,
    pub simulate: bool,
    /// Spawn a batch as soon as the manager is created
    pub spawn_on_start: bool,
    pub anchor_position: Vec3,
    pub anchor_rotation: Orientation,

    // Wander
    pub wander_enabled: bool,
    pub wander_threshold: f32,
    pub wander_distance: f32,
    pub wander_jitter: f32,
    pub wander_destination_threshold: f32,

    // Tag
    pub max_flee_distance: f32,
    pub chaser_multiplier: f32,
    pub catch_range: f32,
    pub time_out_duration: f32,

    // Flock
    pub neighbour_radius: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_threshold: f32,
    pub alignment_threshold: f32,

    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self {
            behavior_mode: BehaviorMode::None,
            spawn_count: 30,
            spawn_radius: 500.0,
            speed: 500.0,
            constraints: 3000.0,
            simulate: true,
            spawn_on_start: false,
            anchor_position: Vec3::default(),
            anchor_rotation: Orientation::default(),
            wander_enabled: false,
            wander_threshold: 1.0,
            wander_distance: 200.0,
            wander_jitter: 1.0,
            wander_destination_threshold: 100.0,
            max_flee_distance: 9_999_999.0,
            chaser_multiplier: 2.0,
            catch_range: 100.0,
            time_out_duration: 5.0,
            neighbour_radius: 900.0,
            separation_weight: 1.0,
            cohesion_weight: 1.0,
            alignment_weight: 1.0,
            cohesion_threshold: 100.0,
            alignment_threshold: 100.0,
            seed: None,
        }
    }
}

/// Per-agent placement data handed to whatever draws or places the agents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Orientation,
    pub scale: Vec3,
    /// True for the agent that is currently "it" in tag mode
    pub tagged: bool,
}

/// Snapshot of the whole flock after a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f32,
    pub mode: BehaviorMode,
    pub tagged: Option<u32>,
    pub pending_tag: Option<u32>,
    pub agents: Vec<AgentState>,
}
