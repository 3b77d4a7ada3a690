//! # Farmstead Common
//!
//! Common types shared by every farmstead crate:
//! - Grid cell coordinates
//! - Planting spot identifiers
//! - Save document schema versions
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
