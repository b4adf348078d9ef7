//! Document domain model.
//!
//! # Responsibilities
//! - Validate document identifiers and physical locations
//! - Provide identity semantics (equality and hashing by id only)
//!
//! # Design Decisions
//! - Construction is the single validation gate; documents are immutable
//! - Variants are a tagged enum, not a type hierarchy

pub mod document;
pub mod error;

pub use document::{validate_id, Document, DocumentKind, MAX_ID_LENGTH};
pub use error::DomainError;
