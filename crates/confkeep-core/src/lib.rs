//! Core library for `confkeep`.
//!
//! Contains the project store (project/key CRUD over the shared JSON
//! document), the raw query gateway, and the cookie record store. This crate
//! depends on `confkeep-storage` for the document backends and the SQLite
//! pool and knows nothing about HTTP.

pub mod cookie;
pub mod error;
pub mod project;
pub mod query;
