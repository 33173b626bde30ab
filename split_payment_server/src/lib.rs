//! # Split payment server
//! This module hosts the HTTP front of the settlement coordinator. It is responsible for:
//! Listening for incoming webhook calls from the payment gateway.
//! Verifying each call's HMAC signature against the shared webhook secret.
//! Routing payment-link events into the settlement engine, and kicking off the payout split and
//! notifications once an order materializes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/payments`: The webhook route for receiving payment-link events from the gateway.

pub mod config;
pub mod errors;

pub mod data_objects;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_objects;

#[cfg(test)]
mod endpoint_tests;
