//! # floodgrid Parallel
//!
//! Processing-mode strategies for running independent work items.
//!
//! This crate provides:
//! - Sequential execution
//! - Parallel execution on Rayon's global pool
//! - Parallel execution on a fixed-size worker pool
//!
//! Without the `parallel` feature every mode runs sequentially and yields
//! identical results.

pub mod strategy;

pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};
