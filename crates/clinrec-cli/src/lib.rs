//! Library components of the `clinrec` command-line tool.

pub mod config;
pub mod logging;
pub mod pipeline;
