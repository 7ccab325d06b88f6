//! CLI module for the watcher binary.
//!
//! Provides command-line parsing and the settings overrides it carries.

pub mod args;

pub use args::Cli;
