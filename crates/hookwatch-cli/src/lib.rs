//! Hookwatch command-line front end.
//!
//! Configuration, logging setup, terminal detection and mode dispatch live
//! here so they can be tested without spawning the binary.

pub mod app;
pub mod config;
pub mod logging;
pub mod terminal;
