//! Per-step phases of the engine pipeline, in execution order:
//!
//! 1. [`environment::diffuse`]
//! 2. [`biological::maintain`] then [`biological::survive`]
//! 3. [`metabolic::photosynthesis`], [`metabolic::react`], [`metabolic::exchange`]
//! 4. [`reproduction::reproduce`]

pub mod biological;
pub mod environment;
pub mod metabolic;
pub mod reproduction;
