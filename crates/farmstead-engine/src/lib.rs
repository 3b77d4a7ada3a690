//! Farmstead Engine - headless driver for the farm simulation.
//!
//! This crate provides the TOML configuration layer and a line-oriented
//! command driver that feeds ticks into a [`farmstead_gameplay::FarmSession`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod config;

pub use app::{run, run_with, App, Command, CommandError, Reply};
pub use config::EngineConfig;
