//! Core of the expense ledger bot.
//!
//! This crate is framework-agnostic: the ledger, its summaries, chunking and
//! command handling live here; Telegram sits behind [`messaging::port`] in an
//! adapter crate.

pub mod chunking;
pub mod clock;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod ledger;
pub mod logging;
pub mod messaging;
pub mod security;

pub use errors::{Error, Result};
