//! Cache types

use serde::{Deserialize, Serialize};

/// Entry count and memory held by a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSize {
    pub entries: usize,
    /// Sum of plain and gzip body lengths, in bytes
    pub memory: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_size_default() {
        let size = CacheSize::default();
        assert_eq!(size.entries, 0);
        assert_eq!(size.memory, 0);
    }

    #[test]
    fn test_cache_size_serialization() {
        let size = CacheSize {
            entries: 12,
            memory: 34_567,
        };

        let json = serde_json::to_string(&size).unwrap();
        assert!(json.contains("\"entries\":12"));
        assert!(json.contains("\"memory\":34567"));

        let deserialized: CacheSize = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, size);
    }
}
