//! Domain workflows: enrolment accounts, the one-per-child legal documents,
//! daily attendance, and the public contact form.

pub mod accounts;
pub mod attendance;
pub mod contact;
pub mod documents;

/// Client address as forwarded by the fronting proxy, when present and
/// parseable. Provenance fields fed from this are nullable by design.
pub(crate) fn client_ip(headers: &axum::http::HeaderMap) -> Option<std::net::IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Error enumeration for repository failures, shared by every workflow's
/// storage trait.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Typed rejection for malformed or missing form fields, raised before
/// anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("field '{field}' is malformed: {reason}")]
    MalformedField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Pull a required free-text field out of a submission: present and non-empty
/// after trimming, or a typed [`ValidationError`].
pub(crate) fn required_field(
    name: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    match value {
        Some(raw) => {
            let cleaned = crate::sanitise::trim_whitespace(raw);
            if cleaned.is_empty() {
                Err(ValidationError::MissingField(name))
            } else {
                Ok(cleaned)
            }
        }
        None => Err(ValidationError::MissingField(name)),
    }
}

/// Optional free-text field: absent or empty-after-trim becomes `None`,
/// never an empty string, so reports can tell "not provided" apart from
/// "provided empty".
pub(crate) fn optional_field(value: Option<&str>) -> Option<String> {
    value
        .map(crate::sanitise::trim_whitespace)
        .filter(|cleaned| !cleaned.is_empty())
}
