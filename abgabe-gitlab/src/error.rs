//! Mapping of HTTP failures onto [`PlatformError`].
//!
//! GitLab reports an existing object in several ways: `409 Conflict` for
//! users and members, `400 Bad Request` with `"has already been taken"` for
//! group and project paths, and `400` with `"already exists"` for tags and
//! forks.

use abgabe_core::PlatformError;
use serde_json::Value;

/// Convert a `ureq` failure into a [`PlatformError`].
pub(crate) fn from_ureq(err: ureq::Error) -> PlatformError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify(status, &body)
        }
        ureq::Error::Transport(transport) => PlatformError::Transport(transport.to_string()),
    }
}

/// Classify an error response by status code and body.
pub(crate) fn classify(status: u16, body: &str) -> PlatformError {
    let message = error_message(body);
    match status {
        404 => PlatformError::NotFound(message),
        409 => PlatformError::Conflict(message),
        400 | 422 if mentions_existing(&message) => PlatformError::Conflict(message),
        _ => PlatformError::Api { status, message },
    }
}

fn mentions_existing(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already been taken") || lower.contains("already exists")
}

/// Flatten GitLab's `message` / `error` payloads into one line.
///
/// `message` is either a string or a map of field name to a list of
/// complaints, e.g. `{"path": ["has already been taken"]}`.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let payload = json.get("message").or_else(|| json.get("error"));
    match payload {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(fields)) => {
            let mut parts: Vec<String> = fields
                .iter()
                .map(|(field, complaints)| format!("{field} {}", flatten(complaints)))
                .collect();
            parts.sort();
            parts.join("; ")
        }
        Some(other) => flatten(other),
        None => body.trim().to_string(),
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::user_taken(409, r#"{"message":"Email has already been taken"}"#)]
    #[case::group_path(400, r#"{"message":{"path":["has already been taken"]}}"#)]
    #[case::tag(400, r#"{"message":"Tag deadline-1 already exists"}"#)]
    #[case::fork(409, r#"{"message":["Project namespace name has already been taken"]}"#)]
    fn existing_objects_are_conflicts(#[case] status: u16, #[case] body: &str) {
        let err = classify(status, body);
        assert!(err.is_conflict(), "got: {err}");
    }

    #[test]
    fn not_found_is_classified() {
        let err = classify(404, r#"{"message":"404 Project Not Found"}"#);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("404 Project Not Found"));
    }

    #[test]
    fn other_bad_requests_stay_api_errors() {
        let err = classify(400, r#"{"error":"name is missing"}"#);
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "name is missing");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn field_errors_are_flattened() {
        let message =
            error_message(r#"{"message":{"path":["is invalid","is reserved"],"name":["x"]}}"#);
        assert_eq!(message, "name x; path is invalid, is reserved");
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let err = classify(502, "<html>Bad Gateway</html>\n");
        assert!(err.to_string().contains("<html>Bad Gateway</html>"));
    }
}
