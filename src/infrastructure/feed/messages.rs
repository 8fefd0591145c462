//! Feed Wire Message Types
//!
//! Wire format types for the ticker feed. Each inbound message is a
//! JSON array of tick records, or a bare record object (the feed's
//! early revisions sent one record per message).
//!
//! # Wire Format
//!
//! ```json
//! [{"symbol": "AAPL", "price": 150.25, "time": "2024-01-15T10:00:00Z"}]
//! ```
//!
//! The `price` field may arrive as a JSON number or a numeric string;
//! `time` is optional ISO-8601 and falls back to receive time.

use serde::{Deserialize, Deserializer, Serialize};

/// One tick record as transmitted by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMessage {
    /// Ticker symbol.
    pub symbol: String,

    /// Price, tolerant of numeric-string transmission.
    #[serde(deserialize_with = "flexible_price")]
    pub price: f64,

    /// ISO-8601 timestamp; absent on some feed revisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// Accept `"price": 150.25` and `"price": "150.25"` alike.
fn flexible_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PriceField {
        Number(f64),
        Text(String),
    }

    match PriceField::deserialize(deserializer)? {
        PriceField::Number(n) => Ok(n),
        PriceField::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("price is not numeric: {s:?}"))),
    }
}
