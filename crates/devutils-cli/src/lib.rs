//! DevUtils CLI library.
//!
//! Command-line front end over the DevUtils engine. The `show` command runs
//! a real build session against [`local_host::LocalHost`], which compiles
//! with a command-line C/C++ compiler instead of an IDE.

pub mod cli;
pub mod commands;
pub mod error;
pub mod local_host;
