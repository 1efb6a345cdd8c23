//! Response envelope shared by every backend endpoint.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// `{ success, message, data }` wrapper around every response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Take the payload, treating a missing `data` as an error.
    pub fn into_data(self) -> Result<T, ApiError> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(ApiError::unknown(
                if self.message.is_empty() {
                    "Response did not include any data".to_string()
                } else {
                    self.message
                },
                200,
            )),
        }
    }
}

/// Page of results from a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}
