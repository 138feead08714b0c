//! Document store access
//!
//! This module defines the `DocumentStore` abstraction the managers persist through:
//! - Get/set/update of single documents by id
//! - Equality and inequality filters, ordering and limits
//! - Atomic multi-document commits with field claims
//! - Typed conversion between records and stored documents

mod codec;
mod document;
mod memory;
pub mod timestamp;

pub use codec::{from_document, to_document};
pub use document::{
    ClaimConflict, Direction, Document, DocumentStore, Filter, OrderBy, Query, StoredDocument,
    Write,
};
pub use memory::MemoryStore;

/// Collection holding session records
pub const SESSIONS: &str = "sessions";

/// Collection holding insight records
pub const INSIGHTS: &str = "insights";
