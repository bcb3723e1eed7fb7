//! Library half of the `tracefix` binary: configuration file handling shared with `xtask`.

pub mod config;
