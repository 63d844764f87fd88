//! Storage Adapters
//!
//! In-memory implementations of the conversation store and catalog ports.
//!
//! - **InMemoryConversationStore** - conversation log for development and tests
//! - **InMemoryCatalog** - products, reviews and orders seeded from YAML

mod in_memory_catalog;
mod in_memory_conversation_store;

pub use in_memory_catalog::{CatalogSeed, InMemoryCatalog, SeedError};
pub use in_memory_conversation_store::InMemoryConversationStore;
