//! Refresh and server event logging.
//!
//! - `logger`: JSONL refresh log and plain-text server log under `~/.coin-dash/`
//! - `reporter`: summaries of the refresh log for the CLI

pub mod logger;
pub mod reporter;
