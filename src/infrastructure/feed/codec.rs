//! Snapshot Codec
//!
//! Decodes inbound feed payloads into validated batches of data points.
//! Decode failures are local to one message: the caller reports and
//! discards the payload, and the connection is never affected.

use chrono::{DateTime, Utc};

use super::messages::TickMessage;
use crate::domain::streaming::{Batch, DataPoint};

/// Codec errors. All variants are non-fatal to the connection.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON decoding failed (malformed payload, missing required field,
    /// or non-numeric price).
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is neither a JSON array nor an object.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),

    /// A record carried a timestamp that is not ISO-8601.
    #[error("invalid timestamp {value:?} for symbol {symbol}")]
    InvalidTimestamp {
        /// The offending symbol.
        symbol: String,
        /// The raw timestamp string.
        value: String,
    },
}

/// JSON codec for the ticker feed.
#[derive(Debug, Default, Clone)]
pub struct SnapshotCodec;

impl SnapshotCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one payload into a batch.
    ///
    /// Accepts a JSON array of records or a single record object.
    /// Records without a `time` field are stamped with `received_at`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the payload is not well-formed or a
    /// record fails validation. The error is local to this message.
    pub fn decode(&self, text: &str, received_at: DateTime<Utc>) -> Result<Batch, CodecError> {
        let trimmed = text.trim();

        let records: Vec<TickMessage> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else if trimmed.starts_with('{') {
            vec![serde_json::from_str(trimmed)?]
        } else {
            // Truncate on a char boundary; the payload is arbitrary text.
            let preview: String = trimmed.chars().take(50).collect();
            return Err(CodecError::InvalidFormat(format!(
                "expected JSON array or object, got: {preview}..."
            )));
        };

        let mut points = Vec::with_capacity(records.len());
        for record in records {
            points.push(to_data_point(record, received_at)?);
        }

        Ok(Batch::from_points(points))
    }
}

/// Convert a wire record into a validated data point.
fn to_data_point(record: TickMessage, received_at: DateTime<Utc>) -> Result<DataPoint, CodecError> {
    let timestamp = match &record.time {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| CodecError::InvalidTimestamp {
                symbol: record.symbol.clone(),
                value: raw.clone(),
            })?,
        None => received_at,
    };

    Ok(DataPoint {
        symbol: record.symbol,
        price: record.price,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn received_at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn decodes_array_payload() {
        let codec = SnapshotCodec::new();
        let json = r#"[
            {"symbol":"AAPL","price":150.25,"time":"2024-01-15T10:00:00Z"},
            {"symbol":"MSFT","price":300.50,"time":"2024-01-15T10:00:00Z"}
        ]"#;

        let batch = codec.decode(json, received_at()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.points()[0].symbol, "AAPL");
        assert_eq!(batch.points()[1].symbol, "MSFT");
    }

    #[test]
    fn decodes_single_object_payload() {
        let codec = SnapshotCodec::new();
        let json = r#"{"symbol":"AAPL","price":"150.25","time":"2024-01-15T10:00:00Z"}"#;

        let batch = codec.decode(json, received_at()).unwrap();
        assert_eq!(batch.len(), 1);
        assert!((batch.points()[0].price - 150.25).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_time_falls_back_to_receive_time() {
        let codec = SnapshotCodec::new();
        let json = r#"{"symbol":"AAPL","price":1.0}"#;

        let batch = codec.decode(json, received_at()).unwrap();
        assert_eq!(batch.points()[0].timestamp, received_at());
    }

    #[test]
    fn empty_array_yields_empty_batch() {
        let codec = SnapshotCodec::new();
        let batch = codec.decode("[]", received_at()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let codec = SnapshotCodec::new();
        assert!(codec.decode("[{\"symbol\":", received_at()).is_err());
    }

    #[test]
    fn non_json_payload_is_invalid_format() {
        let codec = SnapshotCodec::new();
        let err = codec.decode("hello", received_at()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
    }

    #[test]
    fn multibyte_payload_is_invalid_format_not_a_panic() {
        let codec = SnapshotCodec::new();
        // 49 ASCII bytes followed by multi-byte chars puts byte index 50
        // inside a character.
        let payload = format!("{}€€€€", "x".repeat(49));
        let err = codec.decode(&payload, received_at()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
    }

    #[test]
    fn missing_price_is_an_error() {
        let codec = SnapshotCodec::new();
        assert!(codec.decode(r#"{"symbol":"AAPL"}"#, received_at()).is_err());
    }

    #[test]
    fn unparsable_timestamp_is_an_error() {
        let codec = SnapshotCodec::new();
        let err = codec
            .decode(r#"{"symbol":"AAPL","price":1.0,"time":"yesterday"}"#, received_at())
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidTimestamp { .. }));
    }

    #[test]
    fn duplicate_symbols_collapse_to_first() {
        let codec = SnapshotCodec::new();
        let json = r#"[
            {"symbol":"AAPL","price":1.0},
            {"symbol":"AAPL","price":2.0}
        ]"#;

        let batch = codec.decode(json, received_at()).unwrap();
        assert_eq!(batch.len(), 1);
        assert!((batch.points()[0].price - 1.0).abs() < f64::EPSILON);
    }
}
