use thiserror::Error;

/// Unified error type for the storage layer.
///
/// `User` and `CodeUser` surface verbatim to the caller (spec's "user
/// errors"); `Internal` and `Database` represent conditions that should not
/// occur if upstream invariants hold, or infrastructure failures that bubble
/// up unhandled.
#[derive(Debug, Error)]
pub enum KarpsError {
    /// A plain user error: bad paging, unknown sort field, malformed query.
    #[error("{0}")]
    User(String),

    /// A user error carrying one of the four named error codes from the
    /// original error catalogue.
    #[error("{message}")]
    CodeUser {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// An internal error: should not occur if invariants hold.
    #[error("internal error: {0}")]
    Internal(String),

    /// An infrastructure error from the underlying driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl KarpsError {
    /// Code 1: GROUP_CONCAT truncated a cell, named by `columns_param` as it
    /// appeared in the request (so the caller can tell which aggregation
    /// produced the oversize cell).
    pub fn group_concat_truncated(columns_param: &str) -> Self {
        KarpsError::CodeUser {
            code: 1,
            message: format!(
                "Unable to process data, probably due to too many values per row, using {}",
                columns_param
            ),
            details: None,
        }
    }

    /// Code 2: the caller's resolved `allowed_resources` does not include
    /// `resource_id`, which is marked `limited_access`.
    pub fn access_denied(resource_id: &str) -> Self {
        KarpsError::CodeUser {
            code: 2,
            message: format!("user does not have access to resource: {}", resource_id),
            details: Some(serde_json::json!({ "resource": resource_id })),
        }
    }

    /// Code 3: JWT malformed or expired.
    pub fn jwt_error() -> Self {
        KarpsError::CodeUser {
            code: 3,
            message: "JWT was malformed or expired".to_string(),
            details: None,
        }
    }

    /// Code 4: API key malformed, expired, or unverifiable.
    pub fn api_key_error() -> Self {
        KarpsError::CodeUser {
            code: 4,
            message: "API key was malformed, expired or it was not possible to verify key.".to_string(),
            details: None,
        }
    }

    pub fn from_missing_from(requested_from: i64) -> Self {
        KarpsError::User(format!("Requested from does not exist, value: {}", requested_from))
    }
}

pub type Result<T> = std::result::Result<T, KarpsError>;
