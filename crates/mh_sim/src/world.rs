use crate::avatar::{Avatar, MoveInput};
use crate::collectible::{collect_overlaps, Collectible, CollectionEvent};
use crate::config::MotionConfig;
use crate::wind::WindState;

/// What happened during one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub collected: Vec<CollectionEvent>,
    pub score: u32,
}

/// One play session: the avatar, the fixed set of collectibles and the score.
///
/// The avatar is absent until [`World::spawn_avatar`] is called (the model
/// loads asynchronously); until then [`World::step`] changes nothing.
#[derive(Debug, Clone)]
pub struct World {
    config: MotionConfig,
    avatar: Option<Avatar>,
    collectibles: Vec<Collectible>,
    score: u32,
    step_count: u64,
}

impl World {
    pub fn new(config: MotionConfig, collectibles: Vec<Collectible>) -> Self {
        Self {
            config,
            avatar: None,
            collectibles,
            score: 0,
            step_count: 0,
        }
    }

    /// Places the avatar at its spawn point. A second call is ignored.
    pub fn spawn_avatar(&mut self) -> &Avatar {
        self.avatar.get_or_insert_with(|| {
            log::info!("Avatar spawned");
            Avatar::spawn(&self.config)
        })
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn collected_count(&self) -> usize {
        self.collectibles.iter().filter(|c| c.is_collected()).count()
    }

    /// Sum of points over collected entities. Always equals [`World::score`].
    pub fn collected_points_total(&self) -> u32 {
        self.collectibles
            .iter()
            .filter(|c| c.is_collected())
            .fold(0u32, |total, c| total.saturating_add(c.points))
    }

    /// Swaps motion constants mid-session. Takes effect on the next step;
    /// a resting avatar is re-seated on the new ground contact height.
    pub fn set_motion_config(&mut self, config: MotionConfig) {
        self.config = config;
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.half_extents = config.avatar_half_extents();
            if avatar.grounded {
                avatar.position.y = config.ground_contact_height();
            }
        }
    }

    pub fn step(&mut self, dt: f32, input: MoveInput, wind: WindState) -> StepReport {
        let Some(avatar) = self.avatar.as_mut() else {
            return StepReport {
                collected: Vec::new(),
                score: self.score,
            };
        };
        avatar.step(input, wind, dt, &self.config);
        self.step_count += 1;

        let collected = self.collect_overlaps();
        StepReport {
            collected,
            score: self.score,
        }
    }

    /// Collection pass against the avatar's current position.
    pub fn collect_overlaps(&mut self) -> Vec<CollectionEvent> {
        let Some(avatar) = self.avatar.as_ref() else {
            return Vec::new();
        };
        let events = collect_overlaps(&avatar.bounds(), avatar.position.y, &mut self.collectibles);
        for event in &events {
            self.score = self.score.saturating_add(event.points);
            log::info!(
                "Collected box {} for {} points (score {})",
                event.id,
                event.points,
                self.score
            );
        }
        events
    }
}
