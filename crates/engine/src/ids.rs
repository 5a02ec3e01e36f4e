//! Identifier validation: a format check run before any lookup.

use uuid::Uuid;

/// Parse `candidate` as a UUID, or `None` if it is malformed.
///
/// Accepts the hyphenated, simple, braced and URN spellings.
pub fn parse_uid(candidate: &str) -> Option<Uuid> {
    Uuid::try_parse(candidate).ok()
}

/// Whether every candidate is a well-formed UUID.  Never checks existence.
pub fn is_valid_uid<'a>(candidates: impl IntoIterator<Item = &'a str>) -> bool {
    candidates.into_iter().all(|id| parse_uid(id).is_some())
}
