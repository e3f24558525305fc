//! The `taskhub` library crate.
//!
//! This crate contains the domain models, authentication mechanisms,
//! repositories, avatar pipeline, routing configuration and error handling
//! for the TaskHub application. It is used by the main binary (`main.rs`)
//! to construct and run the server.

pub mod auth;
pub mod avatar;
pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod routes;
