//! Maps raw provider responses onto the error taxonomy
//!
//! This is the only place that knows about S3 error codes. The facade
//! hands every non-success response here and propagates the result.

use crate::error::Error;
use crate::transport::Response;
use crate::xml::{self, ErrorDocument};

/// Classify a failed response for the resource named `resource`
pub fn classify(response: &Response, resource: &str) -> Error {
    let document = parse_error_body(&response.body);
    let code = document.as_ref().map(|d| d.code.as_str()).unwrap_or("");
    let message = match document.as_ref() {
        Some(doc) if !doc.message.is_empty() => format!("{resource}: {}", doc.message),
        Some(doc) if !doc.code.is_empty() => format!("{resource}: {}", doc.code),
        _ => format!("{resource}: HTTP {}", response.status),
    };

    classify_code(response.status, code, message)
}

/// Classify an `<Error>` document delivered with a success status
pub fn classify_document(document: &ErrorDocument, resource: &str) -> Error {
    let message = if document.message.is_empty() {
        format!("{resource}: {}", document.code)
    } else {
        format!("{resource}: {}", document.message)
    };
    // Treat as a server-side failure unless the code says otherwise.
    classify_code(500, &document.code, message)
}

fn classify_code(status: u16, code: &str, message: String) -> Error {
    match code {
        "NoSuchBucket" | "NoSuchKey" | "NoSuchUpload" | "NotFound" => Error::NotFound(message),
        "AccessDenied"
        | "InvalidAccessKeyId"
        | "SignatureDoesNotMatch"
        | "ExpiredToken"
        | "InvalidToken"
        | "TokenRefreshRequired"
        | "AllAccessDisabled"
        | "AccountProblem" => Error::Auth(message),
        "BucketAlreadyExists" => Error::NameConflict(message),
        "BucketAlreadyOwnedByYou" => Error::AlreadyOwned(message),
        "BucketNotEmpty" => Error::BucketNotEmpty(message),
        "InvalidLocationConstraint" | "IllegalLocationConstraintException" => {
            Error::InvalidRegion(message)
        }
        "InvalidBucketName"
        | "InvalidArgument"
        | "InvalidPart"
        | "InvalidPartOrder"
        | "EntityTooSmall"
        | "EntityTooLarge"
        | "InvalidRange"
        | "KeyTooLongError"
        | "MalformedXML" => Error::Validation(message),
        "InternalError" | "ServiceUnavailable" | "SlowDown" | "RequestTimeout" => {
            Error::Transport(message)
        }
        _ => classify_status(status, message),
    }
}

/// Fallback for responses without a recognised code (HEAD has no body)
fn classify_status(status: u16, message: String) -> Error {
    match status {
        404 => Error::NotFound(message),
        401 | 403 => Error::Auth(message),
        409 => Error::NameConflict(message),
        400..=499 => Error::Validation(message),
        _ => Error::Transport(message),
    }
}

fn parse_error_body(body: &[u8]) -> Option<ErrorDocument> {
    if body.is_empty() {
        return None;
    }
    xml::from_bytes::<ErrorDocument>(body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_response(status: u16, code: &str) -> Response {
        Response::new(status).with_body(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>{code}</Code><Message>{code} happened</Message></Error>"
        ))
    }

    #[test]
    fn test_head_404_without_body_is_not_found() {
        let err = classify(&Response::new(404), "photos");
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_head_403_without_body_is_auth() {
        let err = classify(&Response::new(403), "photos");
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("HTTP 403"));
    }

    #[test]
    fn test_codes_map_to_taxonomy() {
        assert!(matches!(
            classify(&error_response(404, "NoSuchKey"), "b/k"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify(&error_response(403, "SignatureDoesNotMatch"), "b"),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify(&error_response(409, "BucketAlreadyExists"), "b"),
            Error::NameConflict(_)
        ));
        assert!(matches!(
            classify(&error_response(409, "BucketAlreadyOwnedByYou"), "b"),
            Error::AlreadyOwned(_)
        ));
        assert!(matches!(
            classify(&error_response(409, "BucketNotEmpty"), "b"),
            Error::BucketNotEmpty(_)
        ));
        assert!(matches!(
            classify(&error_response(400, "InvalidLocationConstraint"), "b"),
            Error::InvalidRegion(_)
        ));
        assert!(matches!(
            classify(&error_response(400, "InvalidBucketName"), "b"),
            Error::Validation(_)
        ));
        assert!(matches!(
            classify(&error_response(503, "SlowDown"), "b"),
            Error::Transport(_)
        ));
    }

    #[test]
    fn test_unknown_code_falls_back_to_status() {
        assert!(matches!(
            classify(&error_response(500, "SomethingOdd"), "b"),
            Error::Transport(_)
        ));
        assert!(matches!(
            classify(&error_response(400, "SomethingOdd"), "b"),
            Error::Validation(_)
        ));
    }

    #[test]
    fn test_message_uses_provider_text() {
        let err = classify(&error_response(404, "NoSuchBucket"), "photos");
        assert_eq!(err.to_string(), "Not found: photos: NoSuchBucket happened");
    }

    #[test]
    fn test_garbage_body_uses_status() {
        let response = Response::new(502).with_body("<html>bad gateway</html>");
        let err = classify(&response, "photos");
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_classify_document_defaults_to_transport() {
        let doc = ErrorDocument {
            code: "InternalError".into(),
            message: "We encountered an internal error".into(),
            ..Default::default()
        };
        assert!(matches!(classify_document(&doc, "b/k"), Error::Transport(_)));

        let doc = ErrorDocument {
            code: "NoSuchKey".into(),
            ..Default::default()
        };
        assert!(matches!(classify_document(&doc, "b/k"), Error::NotFound(_)));
    }
}
