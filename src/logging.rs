//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{Method, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

/// Request and response bodies longer than this many bytes are truncated in
/// the `info` logs. The full body is logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values never make it into the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full text is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = read_body(request.into_parts()).await;

    let is_form_post = parts.method == Method::POST
        && parts
            .headers
            .get(CONTENT_TYPE)
            .is_some_and(|content_type| content_type == "application/x-www-form-urlencoded");

    if is_form_post {
        log_body("Received request", &parts, &redact_form_fields(&body_text));
    } else {
        log_body("Received request", &parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_text));
    let response = next.run(request).await;

    let (parts, body_text) = read_body(response.into_parts()).await;
    log_body("Sending response", &parts, &body_text);

    Response::from_parts(parts, Body::from(body_text))
}

/// Replace the values of [REDACTED_FIELDS] in a URL encoded form.
fn redact_form_fields(form_text: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if REDACTED_FIELDS.contains(&name) => format!("{name}=********"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

async fn read_body<T>((parts, body): (T, Body)) -> (T, String) {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => (parts, String::from_utf8_lossy(&bytes).to_string()),
        Err(error) => {
            tracing::error!("could not read body for logging: {error}");
            (parts, String::new())
        }
    }
}

fn log_body(prefix: &str, parts: &impl std::fmt::Debug, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let mut cut = LOG_BODY_LENGTH_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        tracing::info!("{prefix}: {parts:#?}\nbody: {:}...", &body[..cut]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{prefix}: {parts:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redact_form_fields_tests {
    use super::redact_form_fields;

    #[test]
    fn redacts_password_fields() {
        let got = redact_form_fields("email=a%40b.c&password=hunter2&confirm_password=hunter2");

        assert_eq!(
            got,
            "email=a%40b.c&password=********&confirm_password=********"
        );
    }

    #[test]
    fn redacts_when_confirm_password_comes_first() {
        let got = redact_form_fields("confirm_password=hunter2&password=hunter2");

        assert_eq!(got, "confirm_password=********&password=********");
    }

    #[test]
    fn leaves_other_fields_alone() {
        let got = redact_form_fields("description=Rent&amount=1200");

        assert_eq!(got, "description=Rent&amount=1200");
    }
}
