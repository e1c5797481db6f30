//! tagsmith admin library.
//!
//! This crate provides the script tag management service as a library,
//! allowing it to be tested and reused. The [`crate::state::AppState`] is
//! built from capability interfaces (script store, credential store, Shopify
//! transport), so the binary wires in PostgreSQL and reqwest while tests use
//! in-memory stores and fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
