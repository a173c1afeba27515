//! Command-line driver
//!
//! Parses arguments, opens the store and runs one timed action against it.

mod actions;
mod args;

pub use actions::{
    create, delete, purge, read, run, search, stats, update, ActionReport, PurgeBounds,
};
pub use args::{Cli, Command, PurgeArgs};
