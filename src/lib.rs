//! Support Router - session-scoped routing for customer-support conversations
//!
//! Each inbound message is classified to one of the configured support
//! handlers (product details, reviews, orders), answered with the session's
//! recent history as context, and recorded in a per-session conversation log.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
