use crate::record_type::RecordType;
use std::sync::Arc;

/// `QTYPE | lower(name)`. `name` is stored already lower-cased so
/// equality and hashing never need to re-normalize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_type: RecordType,
    pub name: Arc<str>,
}

impl CacheKey {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            record_type,
            name: Arc::from(name.to_ascii_lowercase().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_name() {
        let a = CacheKey::new("Example.COM", RecordType::A);
        let b = CacheKey::new("example.com", RecordType::A);
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_record_type() {
        let a = CacheKey::new("example.com", RecordType::A);
        let b = CacheKey::new("example.com", RecordType::AAAA);
        assert_ne!(a, b);
    }
}
