//! # Biotope
//!
//! Plumbing around [`biotope_core`]: a real-time [`driver`] that paces the
//! engine on a worker thread, and a [`session`] builder that turns an
//! [`EngineConfig`](biotope_core::config::EngineConfig) into a runnable world.

pub mod driver;
pub mod session;

pub use driver::{Completion, Driver, DriverConfig, DriverEvent, DriverHandle, EngineSimulator, Simulator};
pub use session::Session;
