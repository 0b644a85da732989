//! Parameter-sweep engine.
//!
//! Generates sweep values, binds each to the shared external-binary
//! invocation, and runs the resulting tasks on a fixed worker pool.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod range;
pub mod report;
pub mod runner;
pub mod task;
pub mod worker;
