//! Manifest-driven test data generation for problem packages.
//!
//! `generators/gen.yaml` declares the `data/` tree: which files are produced by
//! which generator commands, which are authored by hand, and which extension
//! files (answers, visualizations) are derived from every input.
pub mod clean;
pub mod cli;
pub mod command;
pub mod engine;
pub mod error;
pub mod fsutil;
pub mod generator;
pub mod logging;
pub mod manifest;
pub mod problem;
pub mod runner;
pub mod workflow;

#[cfg(test)]
mod testing;
