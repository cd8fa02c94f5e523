//! Sentinel Sim - headless host for Project Sentinel agents.
//!
//! This crate provides a small kinematic arena, a scripted player stand-in,
//! a fixed-step clock and the scenario runner used by the `sentinel` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod config;
pub mod scenario;
pub mod timing;

pub use config::{SimConfig, CONFIG_FILE};
pub use scenario::{SimSummary, Simulation};
