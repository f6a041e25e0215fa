//! # Stagewise
//!
//! The I/O layer around `stagewise-core`: command-line parsing, the optional
//! `stagewise.toml` configuration, and file loading with path and size
//! validation.

pub mod cli;
pub mod config;
