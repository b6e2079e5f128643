use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every endpoint inside the `{"success": false,
/// "error": ...}` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}
