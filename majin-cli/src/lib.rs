//! Majin CLI library
//!
//! This library exposes the configuration, random-mode and output layers of
//! the `majin` binary for testing.

pub mod config;
pub mod output;
pub mod random_mode;
