//! ID generation utilities.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable and shorter than UUIDs when
    /// represented as strings.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // UUID v4: no time component
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a short random lowercase base36 suffix.
    #[must_use]
    pub fn generate_suffix(&self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_token() {
        let token = IdGenerator::new().generate_token();
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_generate_suffix_is_base36() {
        let suffix = IdGenerator::new().generate_suffix(11);
        assert_eq!(suffix.len(), 11);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }
}
