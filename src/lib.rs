// script_runner/src/lib.rs
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod util;
pub mod script_entry;

pub mod path_metrics;
pub mod venv;
pub mod detect;
pub mod interpreter;
pub mod conflict;

pub mod config;
pub mod logging;
pub mod registry;
pub mod discover;
pub mod add;
pub mod launcher;

pub mod commands;
