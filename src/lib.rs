//! The `taskvault` library crate.
//!
//! This crate contains the authentication and authorization core (password
//! hashing, JWT issue/verify, identity and role middleware), the domain
//! models, routing configuration, the response envelope, and error handling
//! for the TaskVault API. It is used by the main binary (`main.rs`) to
//! construct and run the application.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
