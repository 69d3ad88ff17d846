//! services/api/src/lib.rs
//!
//! The diary HTTP service: store and gateway adapters, configuration, and the
//! axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
