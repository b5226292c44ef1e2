//! sstc — a compiler for a small visual-novel story language.
//!
//! Source text is lexed, parsed into a checked AST, and compiled into a
//! [`dsl::Story`]: an asset catalogue plus a script of label blocks that a
//! playback runtime loads as JSON or YAML.

pub mod config;
pub mod dsl;
