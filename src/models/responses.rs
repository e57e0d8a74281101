//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::client::Cached;
use crate::engine::{duration_ms, EngineStats};

/// Response body for the GET operation (GET /cache/:id)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested id
    pub id: String,
    /// Segment the id was looked up in
    pub segment: String,
    /// The stored value
    pub value: Value,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Remaining TTL in milliseconds
    pub ttl: u64,
}

impl GetResponse {
    /// Creates a new GetResponse from a cached item
    pub fn new(id: impl Into<String>, segment: impl Into<String>, cached: Cached) -> Self {
        Self {
            id: id.into(),
            segment: segment.into(),
            ttl: duration_ms(cached.ttl),
            stored_at: cached.stored_at,
            value: cached.item,
        }
    }
}

/// Response body for the SET operation (PUT /cache/:id)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The id that was set
    pub id: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Key '{}' set successfully", id),
            id,
        }
    }
}

/// Response body for the DELETE operation (DELETE /cache/:id)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The id that was removed
    pub id: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Key '{}' deleted successfully", id),
            id,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    pub total_bytes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<EngineStats> for StatsResponse {
    fn from(stats: EngineStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            total_bytes: stats.total_bytes,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the client is ready, "unavailable" otherwise
    pub status: String,
    /// Whether the cache client is connected
    pub ready: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(ready: bool) -> Self {
        let status = if ready { "healthy" } else { "unavailable" };
        Self {
            status: status.to_string(),
            ready,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_get_response_serialize() {
        let cached = Cached {
            item: Value::from("test_value"),
            stored_at: 1_000,
            ttl: Duration::from_millis(250),
        };
        let resp = GetResponse::new("test_id", "test", cached);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["id"], "test_id");
        assert_eq!(json["segment"], "test");
        assert_eq!(json["value"], "test_value");
        assert_eq!(json["ttl"], 250);
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = EngineStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            total_entries: 100,
            total_bytes: 4096,
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.total_bytes, 4096);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_value(HealthResponse::new(true)).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["ready"], true);
        assert!(json.get("timestamp").is_some());

        let json = serde_json::to_value(HealthResponse::new(false)).unwrap();
        assert_eq!(json["status"], "unavailable");
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
