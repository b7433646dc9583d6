//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by bubble index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod grid;
pub mod state;
pub mod tick;

pub use collision::{CollisionResponse, detect_collision, resolve_collision};
pub use grid::{Bounded, SpatialGrid};
pub use state::{Bubble, BubbleKind, Popper, RngState, SimState};
pub use tick::{TickInput, tick};
