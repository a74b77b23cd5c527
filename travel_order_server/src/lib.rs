//! # Travel Order Server
//! This crate hosts the REST API for the travel order request system. It is responsible for:
//! * Authenticating users (registration, login, bearer-token verification).
//! * Mapping HTTP requests onto the order workflow in [`travel_order_engine`].
//! * Delivering status-change notifications to order owners via the mailer integration.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth/*`: Registration, login, current-user, token refresh and logout.
//! * `/api/orders*`: Create, list, view, review and cancel travel orders.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
