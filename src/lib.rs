//! Bubble Rush - a headless bubble-field simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bubble motion, collisions, poppers)
//! - `sim::grid`: Uniform-grid broad phase rebuilt every tick
//!
//! There is no rendering, audio, or persistence here: the crate owns the
//! entity collection and the spatial index, and exposes a fixed-timestep
//! `tick` that frontends drive however they like.

pub mod sim;

pub use sim::grid::{Bounded, SpatialGrid};
pub use sim::state::{Bubble, BubbleKind, Popper, RngState, SimState};
pub use sim::tick::{TickInput, tick};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// World extent in world units (pixels at native scale)
    pub const WORLD_WIDTH: f32 = 1366.0;
    pub const WORLD_HEIGHT: f32 = 768.0;

    /// Broad-phase cell size. Must stay >= the largest bubble diameter:
    /// same-cell pair enumeration only sees pairs that share a cell, so a
    /// bubble wider than one cell could touch a neighbor it never shares a
    /// cell with.
    pub const CELL_SIZE: f32 = 64.0;

    /// Bubble radius range. Capped so the max diameter (2 * 28 = 56) fits
    /// inside one broad-phase cell.
    pub const BUBBLE_MIN_RADIUS: f32 = 12.0;
    pub const BUBBLE_MAX_RADIUS: f32 = 28.0;

    /// Initial drift speed range per axis (world units / s)
    pub const BUBBLE_MAX_START_SPEED: f32 = 10.0;
    /// Terminal speed cap so wind can't accelerate bubbles forever
    pub const BUBBLE_MAX_SPEED: f32 = 120.0;
    /// Downward drift acceleration (world units / s^2)
    pub const BUBBLE_FALL_ACCEL: f32 = 12.0;
    /// Diagonal wind acceleration when wind is enabled (world units / s^2)
    pub const WIND_ACCEL: f32 = 25.0;

    /// Extra pop radius applied around a successful click
    pub const MULTI_POP_RADIUS: f32 = 64.0;

    /// Autonomous popper tuning
    pub const POPPER_RANGE: f32 = 192.0;
    pub const POPPER_COOLDOWN_TICKS: u32 = 60;

    /// Bombs resist displacement more than normal bubbles during collisions
    pub const BOMB_MASS: f32 = 5.0;
    pub const BUBBLE_MASS: f32 = 1.0;
}
