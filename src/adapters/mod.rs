//! Adapters - Implementations of port interfaces and transports.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Language model providers and the LLM-backed classifier
//! - `storage` - In-memory conversation store and catalog
//! - `postgres` - Durable conversation store
//! - `http` - Request/response endpoints and router assembly
//! - `websocket` - Live session connections

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod websocket;
