//! Shared plumbing for the outbound adapters.

use std::time::Duration;

use stagepass_core::error::ClientError;

/// Builds the HTTP client shared by all adapters, with the configured
/// per-request timeout.
///
/// # Errors
///
/// Returns `ClientError::Unavailable` if the underlying TLS backend cannot
/// be initialized.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Unavailable {
            service: "http",
            message: e.to_string(),
        })
}

/// Strips a trailing slash so adapters can join paths uniformly.
pub(crate) fn trimmed_base(base_url: impl Into<String>) -> String {
    let base = base_url.into();
    base.trim_end_matches('/').to_owned()
}

pub(crate) fn transport_error(service: &'static str, err: &reqwest::Error) -> ClientError {
    ClientError::Unavailable {
        service,
        message: err.to_string(),
    }
}

pub(crate) fn decode_error(service: &'static str, err: &reqwest::Error) -> ClientError {
    ClientError::Decode {
        service,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped() {
        assert_eq!(trimmed_base("http://catalog:8080/"), "http://catalog:8080");
        assert_eq!(trimmed_base("http://catalog:8080"), "http://catalog:8080");
    }
}
