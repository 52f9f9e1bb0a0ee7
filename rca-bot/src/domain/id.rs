use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one knowledge-base build. A rebuild at the same location
/// gets a new id even when the source text is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexId(String);

impl IndexId {
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let hash = blake3::hash(uuid.as_bytes());
        let hex = hex::encode(&hash.as_bytes()[..4]);
        Self(format!("kb-{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = IndexId::generate();
        let b = IndexId::generate();
        assert!(a.as_str().starts_with("kb-"));
        assert_eq!(a.as_str().len(), "kb-".len() + 8);
        assert_ne!(a, b);
    }
}
