//! CLI module for debug-mode - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
