//! Simulation state and core entity types
//!
//! Everything the tick loop reads and writes lives here. The state owns the
//! bubble collection; the spatial grid only ever refers to bubbles by their
//! index in `SimState::bubbles`, so nothing here can dangle as long as the
//! grid is rebuilt whenever the collection changes shape.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Bounded, SpatialGrid};
use crate::consts::*;

/// Bubble variants. Stars are worth chasing, bombs are heavy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BubbleKind {
    #[default]
    Normal,
    Star,
    Bomb,
}

/// A bubble entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub kind: BubbleKind,
}

impl Bubble {
    /// Spawn a bubble at a uniform random spot in the world rectangle
    pub fn random(rng: &mut Pcg32) -> Self {
        let mut bubble = Self::random_at_top(rng);
        bubble.pos.y = rng.random_range(0.0..WORLD_HEIGHT);
        bubble
    }

    /// Spawn a bubble just above the top edge, drifting downward. Used both
    /// for pop replacement and for recycling bubbles that fall off screen.
    pub fn random_at_top(rng: &mut Pcg32) -> Self {
        let radius = rng.random_range(BUBBLE_MIN_RADIUS..=BUBBLE_MAX_RADIUS);

        let kind = match rng.random_range(0..100) {
            0..5 => BubbleKind::Star,
            5..7 => BubbleKind::Bomb,
            _ => BubbleKind::Normal,
        };

        Self {
            pos: Vec2::new(rng.random_range(0.0..WORLD_WIDTH), -radius),
            vel: Vec2::new(
                rng.random_range(-BUBBLE_MAX_START_SPEED..=BUBBLE_MAX_START_SPEED),
                rng.random_range(0.0..=BUBBLE_MAX_START_SPEED),
            ),
            radius,
            kind,
        }
    }

    /// Collision mass; bombs shove normal bubbles around
    pub fn mass(&self) -> f32 {
        match self.kind {
            BubbleKind::Bomb => BOMB_MASS,
            _ => BUBBLE_MASS,
        }
    }
}

impl Bounded for Bubble {
    fn center(&self) -> Vec2 {
        self.pos
    }

    fn bounding_radius(&self) -> f32 {
        self.radius
    }
}

/// An autonomous popper: sits at a fixed spot and pops a random bubble in
/// range whenever its cooldown elapses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Popper {
    pub pos: Vec2,
    pub range: f32,
    /// Ticks until the next pop attempt
    pub cooldown_ticks: u32,
    /// Lifetime pop count
    pub pops: u64,
}

impl Popper {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            range: POPPER_RANGE,
            cooldown_ticks: POPPER_COOLDOWN_TICKS,
            pops: 0,
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Fresh RNG stream from the stored seed
    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

fn default_rng() -> Pcg32 {
    RngState::new(0).to_rng()
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// RNG state
    pub rng_state: RngState,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Total bubbles popped (clicks and poppers)
    pub popped: u64,
    /// Whether the off-screen fan is blowing
    pub wind_enabled: bool,
    /// The caller-owned entity collection the grid indexes into
    pub bubbles: Vec<Bubble>,
    /// Autonomous poppers
    pub poppers: Vec<Popper>,
    /// Live RNG stream; not persisted, re-armed from `rng_state` via
    /// [`SimState::reseed`] after a load
    #[serde(skip, default = "default_rng")]
    pub rng: Pcg32,
    /// Broad phase; rebuilt from scratch every tick, nothing to persist
    #[serde(skip)]
    pub grid: SpatialGrid,
}

impl SimState {
    /// Create a new simulation with `bubble_count` bubbles scattered over
    /// the world rectangle.
    pub fn new(seed: u64, bubble_count: usize) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let bubbles = (0..bubble_count).map(|_| Bubble::random(&mut rng)).collect();

        log::info!("sim initialized: seed={seed}, {bubble_count} bubbles");

        Self {
            seed,
            rng_state,
            time_ticks: 0,
            popped: 0,
            wind_enabled: false,
            bubbles,
            poppers: Vec::new(),
            rng,
            grid: SpatialGrid::default(),
        }
    }

    /// Re-arm the live RNG from `rng_state`. Required after deserializing;
    /// states built by [`SimState::new`] are already armed.
    pub fn reseed(&mut self) {
        self.rng = self.rng_state.to_rng();
    }

    /// Place a popper. Takes effect from the next tick.
    pub fn spawn_popper(&mut self, pos: Vec2) {
        self.poppers.push(Popper::new(pos));
        log::info!("popper spawned at {pos}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bubble_within_bounds() {
        let mut rng = Pcg32::seed_from_u64(123);
        for _ in 0..200 {
            let bubble = Bubble::random(&mut rng);
            assert!(bubble.pos.x >= 0.0 && bubble.pos.x < WORLD_WIDTH);
            assert!(bubble.pos.y >= 0.0 && bubble.pos.y < WORLD_HEIGHT);
            assert!(bubble.radius >= BUBBLE_MIN_RADIUS && bubble.radius <= BUBBLE_MAX_RADIUS);
            // The pair-enumeration precondition: no bubble wider than a cell
            assert!(bubble.radius * 2.0 <= CELL_SIZE);
        }
    }

    #[test]
    fn test_bomb_is_heavier() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut bubble = Bubble::random(&mut rng);

        bubble.kind = BubbleKind::Normal;
        let normal_mass = bubble.mass();
        bubble.kind = BubbleKind::Bomb;
        assert!(bubble.mass() > normal_mass);
    }

    #[test]
    fn test_same_seed_same_spawn() {
        let a = SimState::new(42, 100);
        let b = SimState::new(42, 100);
        assert_eq!(a.bubbles, b.bubbles);
    }

    #[test]
    fn test_state_round_trips_through_serde() {
        let mut state = SimState::new(42, 20);
        state.spawn_popper(Vec2::new(100.0, 100.0));
        state.popped = 3;

        let json = serde_json::to_string(&state).unwrap();
        let mut restored: SimState = serde_json::from_str(&json).unwrap();
        restored.reseed();

        assert_eq!(restored.seed, state.seed);
        assert_eq!(restored.popped, state.popped);
        assert_eq!(restored.bubbles, state.bubbles);
        assert_eq!(restored.poppers.len(), state.poppers.len());
        // The live stream restarts from the stored seed, teacher-save style
        assert_eq!(restored.rng, state.rng_state.to_rng());
    }

    #[test]
    fn test_different_seed_different_spawn() {
        let a = SimState::new(1, 50);
        let b = SimState::new(2, 50);
        assert_ne!(a.bubbles, b.bubbles);
    }
}
