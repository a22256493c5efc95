//! Owns the flock: agent collection, wrap volume, tag state and the
//! per-frame dispatch.

use boids3d_shared::{AgentState, BehaviorMode, FlockSettings, FrameReport};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::{Agent, AgentId};
use crate::config::{self, Bounds};
use crate::error::FlockError;
use crate::math::{random_scalar, Rotator, Vector3};

/// Result of a nearest-agent query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub id: AgentId,
    pub position: Vector3,
    pub distance: f32,
}

#[derive(Debug)]
pub struct FlockManager {
    settings: FlockSettings,
    bounds: Bounds,
    agents: Vec<Agent>,
    next_id: u32,
    simulate: bool,

    // Tag state
    tagged: Option<AgentId>,
    last_tagged: Option<AgentId>,
    pending_tag: Option<AgentId>,
    tag_timeout_remaining: f32,

    frame: u64,
    elapsed: f32,
    rng: StdRng,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl FlockManager {
    /// Validates `settings` and builds an empty manager, spawning the first
    /// batch straight away when `spawn_on_start` is set.
    pub fn new(settings: FlockSettings) -> Result<Self, FlockError> {
        config::validate(&settings)?;

        let mut manager = Self {
            bounds: Bounds::from_constraints(settings.constraints),
            simulate: settings.simulate,
            rng: seeded_rng(settings.seed),
            settings,
            agents: Vec::new(),
            next_id: 0,
            tagged: None,
            last_tagged: None,
            pending_tag: None,
            tag_timeout_remaining: 0.0,
            frame: 0,
            elapsed: 0.0,
        };

        if manager.settings.spawn_on_start {
            manager.spawn()?;
        }
        Ok(manager)
    }

    pub fn settings(&self) -> &FlockSettings {
        &self.settings
    }

    /// Swap in new settings between runs. Agents are kept; the wrap volume
    /// is recalculated and the RNG reseeded when a seed is given.
    pub fn set_config(&mut self, settings: FlockSettings) -> Result<(), FlockError> {
        config::validate(&settings)?;
        self.bounds = Bounds::from_constraints(settings.constraints);
        if let Some(seed) = settings.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.settings = settings;
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn behavior_mode(&self) -> BehaviorMode {
        self.settings.behavior_mode
    }

    pub fn set_behavior_mode(&mut self, mode: BehaviorMode) {
        self.settings.behavior_mode = mode;
    }

    pub fn is_simulating(&self) -> bool {
        self.simulate
    }

    pub fn set_simulate(&mut self, simulate: bool) {
        self.simulate = simulate;
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.index_of(id).map(|index| &self.agents[index])
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn tagged(&self) -> Option<AgentId> {
        self.tagged
    }

    pub fn last_tagged(&self) -> Option<AgentId> {
        self.last_tagged
    }

    pub fn pending_tag(&self) -> Option<AgentId> {
        self.pending_tag
    }

    pub fn tag_timeout_remaining(&self) -> f32 {
        self.tag_timeout_remaining
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // Ids are handed out in increasing order and agents are only ever
    // appended, so the collection stays sorted by id.
    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.binary_search_by_key(&id, |agent| agent.id).ok()
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !self.simulate {
            return;
        }
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Ignoring tick with invalid dt {}", dt);
            return;
        }

        match self.settings.behavior_mode {
            BehaviorMode::None => {}
            BehaviorMode::Tag => self.tag_update_agents(dt),
            BehaviorMode::Flock => self.flock_update_agents(dt),
        }

        self.frame += 1;
        self.elapsed += dt;
        log::trace!(
            "Frame {} ({}) with {} agents",
            self.frame,
            self.settings.behavior_mode,
            self.agents.len()
        );
    }

    /// Count down the handoff delay, then commit the pending agent as
    /// tagged. The commit happens in the same call that exhausts the delay.
    pub fn update_tag_timeout(&mut self, dt: f32) {
        if self.tag_timeout_remaining > 0.0 {
            self.tag_timeout_remaining = (self.tag_timeout_remaining - dt).max(0.0);
        }
        if self.tag_timeout_remaining <= 0.0 && self.tagged != self.pending_tag {
            if let Some(id) = self.pending_tag {
                log::debug!("Agent {} is now tagged", id);
            }
            self.tagged = self.pending_tag;
        }
    }

    // Agents are updated in place: later agents see the already-moved
    // positions of earlier ones within the same frame.
    fn tag_update_agents(&mut self, dt: f32) {
        self.update_tag_timeout(dt);
        for index in 0..self.agents.len() {
            let nearest = self.find_nearest_at(index);
            let agent = &self.agents[index];
            let is_tagged = self.tagged == Some(agent.id);
            let target = agent.tag_steering(nearest, is_tagged, &self.settings);
            self.move_agent(index, target, dt);
        }
    }

    fn flock_update_agents(&mut self, dt: f32) {
        let radius = self.settings.neighbour_radius;
        for index in 0..self.agents.len() {
            let target = {
                let neighbors = self.neighbors_at(index, radius);
                self.agents[index].flock_steering(&neighbors, &self.settings)
            };
            self.move_agent(index, target, dt);
        }
    }

    fn move_agent(&mut self, index: usize, target: Vector3, dt: f32) {
        let Self {
            agents,
            settings,
            bounds,
            rng,
            ..
        } = self;
        agents[index].move_with(target, dt, settings, bounds, rng);
    }

    /// Closest other agent within `max_flee_distance`, ignoring the last
    /// tagged agent. Ties go to the first agent in collection order.
    pub fn nearest(&self, id: AgentId) -> Option<Nearest> {
        self.index_of(id).and_then(|index| self.nearest_at(index))
    }

    fn nearest_at(&self, index: usize) -> Option<Nearest> {
        let this = &self.agents[index];
        let mut nearest_distance = self.settings.max_flee_distance;
        let mut nearest = None;

        for other in &self.agents {
            if other.id == this.id || Some(other.id) == self.last_tagged {
                continue;
            }
            let distance = this.position.distance(&other.position);
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(Nearest {
                    id: other.id,
                    position: other.position,
                    distance,
                });
            }
        }
        nearest
    }

    /// Hand the tag over when `chaser` is tagged and `nearest` is within
    /// `catch_range`. The caught agent only becomes tagged once the
    /// timeout runs out. Returns whether a catch happened.
    pub fn maybe_catch_tag(&mut self, chaser: AgentId, nearest: &Nearest) -> bool {
        if self.tagged != Some(chaser) || nearest.distance >= self.settings.catch_range {
            return false;
        }

        log::debug!(
            "Agent {} caught agent {} at distance {:.2}",
            chaser,
            nearest.id,
            nearest.distance
        );
        self.last_tagged = self.tagged;
        self.pending_tag = Some(nearest.id);
        self.tagged = None;
        self.tag_timeout_remaining = self.settings.time_out_duration;
        true
    }

    /// Position of the nearest agent, or the origin when none qualifies.
    ///
    /// Called for the tagged agent this may hand the tag over; see
    /// [`FlockManager::maybe_catch_tag`].
    pub fn find_nearest(&mut self, id: AgentId) -> Vector3 {
        match self.index_of(id) {
            Some(index) => self.find_nearest_at(index),
            None => Vector3::ZERO,
        }
    }

    fn find_nearest_at(&mut self, index: usize) -> Vector3 {
        let id = self.agents[index].id;
        match self.nearest_at(index) {
            Some(nearest) => {
                self.maybe_catch_tag(id, &nearest);
                nearest.position
            }
            None => Vector3::ZERO,
        }
    }

    /// Agents strictly closer than `radius` to `id`, in collection order.
    pub fn get_neighbors(&self, id: AgentId, radius: f32) -> Vec<&Agent> {
        match self.index_of(id) {
            Some(index) => self.neighbors_at(index, radius),
            None => Vec::new(),
        }
    }

    fn neighbors_at(&self, index: usize, radius: f32) -> Vec<&Agent> {
        let this = &self.agents[index];
        self.agents
            .iter()
            .filter(|other| other.id != this.id)
            .filter(|other| this.position.distance(&other.position) < radius)
            .collect()
    }

    /// Spawn `spawn_count` agents within `spawn_radius` of the anchor.
    pub fn spawn(&mut self) -> Result<Vec<AgentId>, FlockError> {
        self.spawn_batch(self.settings.spawn_count, self.settings.spawn_radius)
    }

    /// Spawn `count` agents at random points within `radius` of the anchor,
    /// facing the anchor's orientation, and start simulating.
    pub fn spawn_batch(
        &mut self,
        count: usize,
        radius: f32,
    ) -> Result<Vec<AgentId>, FlockError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(FlockError::InvalidSpawn {
                reason: "spawn radius must be a finite, non-negative number",
                value: radius,
            });
        }

        let anchor = Vector3::from(self.settings.anchor_position);
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let direction = Vector3::random_unit(&mut self.rng);
            let distance = random_scalar(&mut self.rng, 0.0, radius);
            ids.push(self.insert(anchor + direction * distance));
        }

        self.simulate = true;
        log::debug!(
            "Spawned {} agents within {} of ({:.1}, {:.1}, {:.1}); {} total",
            count,
            radius,
            anchor.x,
            anchor.y,
            anchor.z,
            self.agents.len()
        );
        Ok(ids)
    }

    /// Place a single agent at `position`, facing the anchor's orientation.
    pub fn spawn_at(&mut self, position: Vector3) -> Result<AgentId, FlockError> {
        if !position.is_finite() {
            return Err(FlockError::InvalidSpawn {
                reason: "spawn position must be finite",
                value: position.length(),
            });
        }
        let id = self.insert(position);
        self.simulate = true;
        log::debug!("Spawned agent {} at {:?}", id, position);
        Ok(id)
    }

    // The first agent of an empty flock is the default for the tag.
    fn insert(&mut self, position: Vector3) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        if self.agents.is_empty() {
            self.pending_tag = Some(id);
        }
        let rotation = Rotator::from(self.settings.anchor_rotation);
        self.agents.push(Agent::new(id, position, rotation));
        id
    }

    /// Remove every agent and stop simulating.
    pub fn delete_all(&mut self) {
        let removed = self.agents.len();
        self.simulate = false;
        self.agents.clear();
        self.tagged = None;
        self.last_tagged = None;
        self.pending_tag = None;
        self.tag_timeout_remaining = 0.0;
        log::info!("Deleted {} agents", removed);
    }

    /// Delete everything and spawn a fresh batch.
    pub fn reset(&mut self) -> Result<Vec<AgentId>, FlockError> {
        self.delete_all();
        let ids = self.spawn()?;
        log::info!("Flock reset with {} agents", ids.len());
        Ok(ids)
    }

    /// Placement data for every agent, in collection order.
    pub fn agent_states(&self) -> Vec<AgentState> {
        self.agents
            .iter()
            .map(|agent| agent.state(self.tagged == Some(agent.id)))
            .collect()
    }

    pub fn frame_report(&self) -> FrameReport {
        FrameReport {
            frame: self.frame,
            elapsed: self.elapsed,
            mode: self.settings.behavior_mode,
            tagged: self.tagged.map(AgentId::get),
            pending_tag: self.pending_tag.map(AgentId::get),
            agents: self.agent_states(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> FlockSettings {
        FlockSettings {
            seed: Some(11),
            ..FlockSettings::default()
        }
    }

    fn manager_with(
        positions: &[Vector3],
        settings: FlockSettings,
    ) -> (FlockManager, Vec<AgentId>) {
        let mut manager = FlockManager::new(settings).unwrap();
        let ids = positions
            .iter()
            .map(|p| manager.spawn_at(*p).unwrap())
            .collect();
        (manager, ids)
    }

    #[test]
    fn test_new_rejects_bad_constraints() {
        let result = FlockManager::new(FlockSettings {
            constraints: 0.0,
            ..settings()
        });
        assert!(matches!(result, Err(FlockError::InvalidConfig { .. })));
    }

    #[test]
    fn test_spawn_on_start() {
        let manager = FlockManager::new(FlockSettings {
            spawn_on_start: true,
            spawn_count: 7,
            ..settings()
        })
        .unwrap();
        assert_eq!(manager.len(), 7);
        assert!(manager.is_simulating());
    }

    #[test]
    fn test_spawn_within_radius_of_anchor() {
        let mut manager = FlockManager::new(FlockSettings {
            anchor_position: boids3d_shared::Vec3::new(100.0, -50.0, 10.0),
            ..settings()
        })
        .unwrap();
        let ids = manager.spawn_batch(25, 40.0).unwrap();
        assert_eq!(ids.len(), 25);
        let anchor = Vector3::new(100.0, -50.0, 10.0);
        for agent in manager.agents() {
            assert!(agent.position.distance(&anchor) <= 40.0 + 1e-3);
            assert_eq!(agent.velocity, Vector3::ZERO);
        }
    }

    #[test]
    fn test_spawn_rejects_negative_radius() {
        let mut manager = FlockManager::new(settings()).unwrap();
        assert!(matches!(
            manager.spawn_batch(3, -1.0),
            Err(FlockError::InvalidSpawn { .. })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_first_spawn_sets_pending_tag() {
        let mut manager = FlockManager::new(settings()).unwrap();
        let first = manager.spawn_batch(3, 10.0).unwrap();
        assert_eq!(manager.pending_tag(), Some(first[0]));

        manager.spawn_batch(3, 10.0).unwrap();
        assert_eq!(manager.pending_tag(), Some(first[0]));
    }

    #[test]
    fn test_delete_all_clears_state() {
        let mut manager = FlockManager::new(settings()).unwrap();
        manager.spawn_batch(4, 10.0).unwrap();
        manager.delete_all();
        assert!(manager.is_empty());
        assert!(!manager.is_simulating());
        assert_eq!(manager.pending_tag(), None);
        assert_eq!(manager.tagged(), None);

        // Empty managers tick and query without trouble.
        manager.set_simulate(true);
        manager.set_behavior_mode(BehaviorMode::Tag);
        manager.tick(0.1);
        assert!(manager.agent_states().is_empty());
    }

    #[test]
    fn test_reset_spawns_fresh_ids() {
        let mut manager = FlockManager::new(FlockSettings {
            spawn_count: 5,
            ..settings()
        })
        .unwrap();
        let before = manager.spawn().unwrap();
        let after = manager.reset().unwrap();
        assert_eq!(manager.len(), 5);
        assert!(after.iter().all(|id| !before.contains(id)));
        assert_eq!(manager.pending_tag(), Some(after[0]));
        assert!(manager.is_simulating());
    }

    #[test]
    fn test_tick_is_noop_when_not_simulating() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0)],
            FlockSettings {
                behavior_mode: BehaviorMode::Flock,
                ..settings()
            },
        );
        manager.set_simulate(false);
        manager.tick(0.1);
        assert_eq!(manager.frame(), 0);
        assert_eq!(manager.agent(ids[0]).unwrap().position, Vector3::ZERO);
    }

    #[test]
    fn test_none_mode_does_not_move_agents() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0)],
            settings(),
        );
        manager.tick(0.1);
        assert_eq!(manager.frame(), 1);
        assert_eq!(manager.agent(ids[1]).unwrap().position, Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_get_neighbors_is_strict_and_excludes_self() {
        let (manager, ids) = manager_with(
            &[
                Vector3::ZERO,
                Vector3::new(5.0, 0.0, 0.0),
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(0.0, 3.0, 0.0),
            ],
            settings(),
        );
        let neighbors: Vec<AgentId> = manager
            .get_neighbors(ids[0], 10.0)
            .iter()
            .map(|agent| agent.id)
            .collect();
        assert_eq!(neighbors, vec![ids[1], ids[3]]);

        let unknown = AgentId(999);
        assert!(manager.get_neighbors(unknown, 100.0).is_empty());
    }

    #[test]
    fn test_nearest_skips_last_tagged_and_ties_to_first() {
        let (mut manager, ids) = manager_with(
            &[
                Vector3::ZERO,
                Vector3::new(4.0, 0.0, 0.0),
                Vector3::new(-4.0, 0.0, 0.0),
                Vector3::new(0.0, 9.0, 0.0),
            ],
            settings(),
        );
        assert_eq!(manager.nearest(ids[0]).unwrap().id, ids[1]);

        manager.last_tagged = Some(ids[1]);
        assert_eq!(manager.nearest(ids[0]).unwrap().id, ids[2]);
    }

    #[test]
    fn test_nearest_respects_max_flee_distance() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(50.0, 0.0, 0.0)],
            FlockSettings {
                max_flee_distance: 20.0,
                ..settings()
            },
        );
        assert_eq!(manager.nearest(ids[0]), None);
        assert_eq!(manager.find_nearest(ids[0]), Vector3::ZERO);
    }

    #[test]
    fn test_catch_only_for_tagged_chaser() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(5.0, 0.0, 0.0)],
            FlockSettings {
                catch_range: 10.0,
                ..settings()
            },
        );
        let nearest = manager.nearest(ids[1]).unwrap();
        assert!(!manager.maybe_catch_tag(ids[1], &nearest));

        manager.update_tag_timeout(0.0);
        assert_eq!(manager.tagged(), Some(ids[0]));

        let far = Nearest {
            distance: 10.0,
            ..manager.nearest(ids[0]).unwrap()
        };
        assert!(!manager.maybe_catch_tag(ids[0], &far));

        let nearest = manager.nearest(ids[0]).unwrap();
        assert!(manager.maybe_catch_tag(ids[0], &nearest));
        assert_eq!(manager.tagged(), None);
        assert_eq!(manager.last_tagged(), Some(ids[0]));
        assert_eq!(manager.pending_tag(), Some(ids[1]));
    }

    #[test]
    fn test_tag_timeout_never_negative() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(5.0, 0.0, 0.0)],
            FlockSettings {
                time_out_duration: 1.0,
                ..settings()
            },
        );
        manager.update_tag_timeout(0.0);
        manager.find_nearest(ids[0]);
        assert_eq!(manager.tag_timeout_remaining(), 1.0);

        manager.update_tag_timeout(3.0);
        assert_eq!(manager.tag_timeout_remaining(), 0.0);
        assert_eq!(manager.tagged(), Some(ids[1]));
    }

    #[test]
    fn test_frame_report_marks_tagged_agent() {
        let (mut manager, ids) = manager_with(
            &[Vector3::ZERO, Vector3::new(500.0, 0.0, 0.0)],
            FlockSettings {
                behavior_mode: BehaviorMode::Tag,
                ..settings()
            },
        );
        manager.tick(0.1);
        let report = manager.frame_report();
        assert_eq!(report.frame, 1);
        assert_eq!(report.mode, BehaviorMode::Tag);
        assert_eq!(report.tagged, Some(ids[0].get()));
        assert!(report.agents[0].tagged);
        assert!(!report.agents[1].tagged);
    }

    #[test]
    fn test_set_config_recalculates_bounds() {
        let mut manager = FlockManager::new(settings()).unwrap();
        manager
            .set_config(FlockSettings {
                constraints: 200.0,
                ..settings()
            })
            .unwrap();
        assert_eq!(manager.bounds().max, Vector3::splat(100.0));
        assert!(manager
            .set_config(FlockSettings {
                speed: -1.0,
                ..settings()
            })
            .is_err());
        assert_eq!(manager.bounds().max, Vector3::splat(100.0));
    }
}
