//! # CLI Layer
//!
//! This module is **one possible UI client** for tcgbinder, not the
//! application itself. It is the only place that:
//! - Knows about terminal I/O (stdout, stderr, prompts)
//! - Parses arguments
//! - Formats pages for human consumption
//!
//! Each invocation is one short session: build the context, dispatch to the
//! API, drain the main context until outstanding catalog or image work is
//! done, print the outcome.
//!
//! ## Structure
//!
//! - [`setup`]: clap definitions and version string
//! - [`commands`]: `run()` and the per-command handlers
//! - [`render`]: page, list and message formatting

mod commands;
mod render;
mod setup;

pub use commands::run;
