//! API Data Transfer Objects
//!
//! Wire types for requests and responses. Every successful response wraps
//! its payload in a `result` envelope.

use serde::Serialize;

/// Success envelope: `{"result": ...}`
#[derive(Debug, Serialize)]
pub struct ResultResponse<T> {
    pub result: T,
}

impl<T> ResultResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub dataset_count: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_envelope_shape() {
        let body = serde_json::to_value(ResultResponse::new(vec!["courses"])).unwrap();
        assert_eq!(body, serde_json::json!({"result": ["courses"]}));
    }
}
