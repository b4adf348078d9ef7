//! The document entity and its variants.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::DomainError;

/// Maximum number of characters in a document id.
pub const MAX_ID_LENGTH: usize = 20;

const ID_PATTERN: &str = r"^[A-Za-z0-9]+\.[A-Za-z0-9]+$";

fn id_regex() -> &'static Regex {
    static ID_REGEX: OnceLock<Regex> = OnceLock::new();
    ID_REGEX.get_or_init(|| Regex::new(ID_PATTERN).expect("document id pattern is valid"))
}

/// Check a document id against the identifier rules.
///
/// An id is accepted when it is not blank, consists of an alphanumeric stem,
/// a single dot and an alphanumeric extension, and is at most
/// [`MAX_ID_LENGTH`] characters long.
pub fn validate_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::EmptyId);
    }
    if id.chars().count() > MAX_ID_LENGTH || !id_regex().is_match(id) {
        return Err(DomainError::MalformedId);
    }
    Ok(())
}

/// Where a document's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// Bytes stored at a backend-specific address (a filesystem path).
    Physical { location: String },
    /// Bytes held by the in-memory store, addressed by id.
    InMemory,
}

/// A validated document identifier together with its storage variant.
///
/// Two documents are equal when their ids are equal, whatever their kind.
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    kind: DocumentKind,
}

impl Document {
    /// Build a filesystem-backed document.
    ///
    /// The location is only checked for blankness here; whether it exists is
    /// for the mapper to find out.
    pub fn physical(id: &str, location: &str) -> Result<Self, DomainError> {
        validate_id(id)?;
        if location.trim().is_empty() {
            return Err(DomainError::EmptyLocation);
        }
        Ok(Self {
            id: id.to_string(),
            kind: DocumentKind::Physical {
                location: location.to_string(),
            },
        })
    }

    /// Build a heap-backed document.
    pub fn in_memory(id: &str) -> Result<Self, DomainError> {
        validate_id(id)?;
        Ok(Self {
            id: id.to_string(),
            kind: DocumentKind::InMemory,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    /// Physical location, if this is a physical document.
    pub fn location(&self) -> Option<&str> {
        match &self.kind {
            DocumentKind::Physical { location } => Some(location),
            DocumentKind::InMemory => None,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::error::Error;

    const DOCUMENT_ID: &str = "foo.txt";
    const DOCUMENT_PATH: &str = "/tmp/docuserv/foo.txt";

    fn assert_rejected(result: Result<Document, DomainError>, expected: &str) {
        let err = result.expect_err("construction should fail");
        assert_eq!(err.to_string(), expected);
        assert!(err.source().is_none());
    }

    #[test]
    fn create_physical_document() {
        let document = Document::physical(DOCUMENT_ID, DOCUMENT_PATH).unwrap();
        assert_eq!(document.id(), DOCUMENT_ID);
        assert_eq!(document.location(), Some(DOCUMENT_PATH));
    }

    #[test]
    fn create_in_memory_document() {
        let document = Document::in_memory(DOCUMENT_ID).unwrap();
        assert_eq!(document.id(), DOCUMENT_ID);
        assert_eq!(document.kind(), &DocumentKind::InMemory);
        assert!(document.location().is_none());
    }

    #[test]
    fn accepted_ids_round_trip() {
        for id in ["a.b", "A1.z9", "README.md", "abcdefghijklmno.pdf", "1234567890123456.789"] {
            assert_eq!(Document::in_memory(id).unwrap().id(), id);
        }
    }

    #[test]
    fn malformed_id_trailing_slash() {
        assert_rejected(
            Document::physical("test.bar/", DOCUMENT_PATH),
            "Document id must be alpha-numeric with a '.' extension and no more than 20 characters",
        );
    }

    #[test]
    fn malformed_id_embedded_separator() {
        assert_rejected(
            Document::physical("bad/id.txt", "/tmp/x"),
            "Document id must be alpha-numeric with a '.' extension and no more than 20 characters",
        );
    }

    #[test]
    fn malformed_id_shapes() {
        for id in ["noextension", ".txt", "foo.", "a.b.c", "foo bar.txt", "über.txt", " a.txt"] {
            assert_eq!(Document::in_memory(id).unwrap_err(), DomainError::MalformedId, "{id}");
        }
    }

    #[test]
    fn id_length_limit() {
        let at_limit = "abcdefghijklmnop.txt";
        assert_eq!(at_limit.len(), MAX_ID_LENGTH);
        assert!(Document::in_memory(at_limit).is_ok());

        let over_limit = "abcdefghijklmnopq.txt";
        assert_eq!(Document::in_memory(over_limit).unwrap_err(), DomainError::MalformedId);
    }

    #[test]
    fn blank_id_is_rejected() {
        assert_rejected(Document::physical("", DOCUMENT_PATH), "id may not be empty or null");
        assert_rejected(Document::physical(" ", DOCUMENT_PATH), "id may not be empty or null");
        assert_rejected(Document::in_memory("\t"), "id may not be empty or null");
    }

    #[test]
    fn blank_location_is_rejected() {
        assert_rejected(Document::physical(DOCUMENT_ID, ""), "physicalLocation may not be empty or null");
        assert_rejected(Document::physical(DOCUMENT_ID, " "), "physicalLocation may not be empty or null");
    }

    #[test]
    fn id_is_checked_before_location() {
        assert_eq!(Document::physical(" ", " ").unwrap_err(), DomainError::EmptyId);
    }

    #[test]
    fn equality_is_by_id() {
        let a = Document::physical(DOCUMENT_ID, DOCUMENT_PATH).unwrap();
        let b = Document::physical(DOCUMENT_ID, DOCUMENT_PATH).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, a);

        let c = Document::physical("bar.txt", DOCUMENT_PATH).unwrap();
        assert_ne!(a, c);
        assert_ne!(c, a);
    }

    #[test]
    fn equality_ignores_variant_and_location() {
        let physical = Document::physical(DOCUMENT_ID, "/somewhere/else").unwrap();
        let in_memory = Document::in_memory(DOCUMENT_ID).unwrap();
        assert_eq!(physical, in_memory);

        let mut set = HashSet::new();
        set.insert(physical);
        assert!(set.contains(&in_memory));
    }

    #[test]
    fn hash_set_membership() {
        let mut documents = HashSet::new();
        documents.insert(Document::physical(DOCUMENT_ID, DOCUMENT_PATH).unwrap());

        assert!(documents.contains(&Document::physical(DOCUMENT_ID, DOCUMENT_PATH).unwrap()));
        assert!(!documents.contains(&Document::physical("bar.txt", DOCUMENT_PATH).unwrap()));
    }
}
