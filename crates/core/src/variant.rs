//! Variant identity: the (product reference, color, size) triple behind a SKU.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Normalized variant triple. Two keys built from input that differs only in
/// surrounding whitespace or letter case compare equal.
///
/// Normalization: reference and size are trimmed and uppercased, color is
/// trimmed and lowercased. Cut receiving records arrive with inconsistent
/// casing between the planned and received grades, so the key is the place
/// where that is smoothed out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    reference: String,
    color: String,
    size: String,
}

impl VariantKey {
    pub fn new(
        reference: impl AsRef<str>,
        color: impl AsRef<str>,
        size: impl AsRef<str>,
    ) -> DomainResult<Self> {
        let reference = reference.as_ref().trim().to_uppercase();
        let color = color.as_ref().trim().to_lowercase();
        let size = size.as_ref().trim().to_uppercase();

        if reference.is_empty() {
            return Err(DomainError::validation("variant reference must not be empty"));
        }
        if color.is_empty() {
            return Err(DomainError::validation("variant color must not be empty"));
        }
        if size.is_empty() {
            return Err(DomainError::validation("variant size must not be empty"));
        }

        Ok(Self {
            reference,
            color,
            size,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn size(&self) -> &str {
        &self.size
    }
}

impl core::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.reference, self.color, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let a = VariantKey::new(" vt-010 ", "Preto", "m").unwrap();
        let b = VariantKey::new("VT-010", "preto ", " M").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.reference(), "VT-010");
        assert_eq!(a.color(), "preto");
        assert_eq!(a.size(), "M");
    }

    #[test]
    fn rejects_blank_parts() {
        match VariantKey::new("VT-010", "  ", "M") {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("color")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }
}
