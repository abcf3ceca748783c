use time::OffsetDateTime;

/// A stored query and the summary produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    query: String,
    summary: String,
    embedding: Option<Vec<f32>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl MemoryRecord {
    pub(crate) fn new(
        query: String,
        summary: String,
        embedding: Option<Vec<f32>>,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self {
            query,
            summary,
            embedding,
            created_at,
            updated_at,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The stored query embedding, if one was available at write time.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

/// The best stored record for a lookup, with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMatch {
    pub query: String,
    pub summary: String,
    pub score: f32,
}

/// Serializes a vector as little-endian f32 bytes.
pub(crate) fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Inverse of [`encode_embedding`]. Returns `None` if the byte length is not
/// a multiple of four.
pub(crate) fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Converts Unix milliseconds back to a timestamp, clamping out-of-range values
/// to the epoch.
pub(crate) fn from_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_preserve_values() {
        let original = vec![0.0, -1.5, 3.25, f32::MIN_POSITIVE];
        let bytes = encode_embedding(&original);
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_embedding(&bytes).unwrap(), original);
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        assert!(decode_embedding(&[0, 0, 128]).is_none());
    }

    #[test]
    fn millis_convert_back_to_timestamp() {
        let ts = from_millis(1_700_000_000_123);
        assert_eq!(ts.unix_timestamp(), 1_700_000_000);
        assert_eq!(ts.millisecond(), 123);
    }
}
