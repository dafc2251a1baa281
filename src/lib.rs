//! Todo API: CRUD over Postgres with a read-through key/value cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
