//! # Farmstead Gameplay
//!
//! Simulation core for a small farming game.
//!
//! This crate provides:
//! - Crops with a young/mature growth state machine
//! - Planting spots and the farm grid that owns them
//! - Slot-based inventory with exhaustive stacking
//! - Hold-to-commit interaction arbiter
//! - Save/load of grid and inventory state
//! - Clock abstraction, visual events and the session aggregate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clock;
pub mod crop;
pub mod grid;
pub mod interaction;
pub mod inventory;
pub mod item;
pub mod planting;
pub mod save;
pub mod session;
pub mod visual;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::crop::*;
    pub use crate::grid::*;
    pub use crate::interaction::*;
    pub use crate::inventory::*;
    pub use crate::item::*;
    pub use crate::planting::*;
    pub use crate::save::*;
    pub use crate::session::*;
    pub use crate::visual::*;
}

pub use prelude::*;
