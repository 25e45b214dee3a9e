//! Command-line interface for the adapter binary

pub mod args;

pub use args::{Args, Commands, Verbosity};
