use thiserror::Error;

/// Failures surfaced by [`crate::AqsClient`].
///
/// `MissingField`, `InvalidFips` and `InvalidDate` are validation failures and
/// are raised before any network activity. `Request`, `Http` and `Decode` wrap
/// a request that was actually issued. A well-formed response whose header
/// reports a non-success status is *not* an error here; callers inspect the
/// header and branch (see [`crate::model::header_status`]).
#[derive(Debug, Error)]
pub enum AqsError {
    #[error("required request field '{0}' is missing or empty")]
    MissingField(String),

    #[error("'{0}' is not a 5-digit county FIPS code (2-digit state + 3-digit county)")]
    InvalidFips(String),

    #[error("'{0}' is not a valid YYYYMMDD date")]
    InvalidDate(String),

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url} as JSON")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response payload did not match the expected Header/Data shape")]
    Payload(#[source] serde_json::Error),
}

impl AqsError {
    /// True for failures detected before the request was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AqsError::MissingField(_) | AqsError::InvalidFips(_) | AqsError::InvalidDate(_)
        )
    }
}
