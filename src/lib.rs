#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod backend;
pub mod cli;
pub mod config;
pub mod create;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod menu;
pub mod ops;
pub mod paths;
pub mod progress;
pub mod prompt;
pub mod session;
pub mod snapshot;
pub mod validate;
