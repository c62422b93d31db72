use serde::{Deserialize, Serialize};
use vinmint_core::{BackendKind, Prefix};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
}

impl HealthResponse {
    pub fn ok(backend: BackendKind) -> Self {
        Self {
            status: "ok".to_string(),
            backend: backend.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSequenceResponse {
    pub prefix: Prefix,
    pub current: u64,
    pub backend: String,
}
