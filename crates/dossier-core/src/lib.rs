//! Core types and trait definitions for the Dossier record store.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! The store backend and the API layer both depend on it.

pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
