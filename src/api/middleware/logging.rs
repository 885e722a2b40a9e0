use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info, warn};

/// One line per request, tagged with the session when the path names one.
/// Level follows the status class.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let session = session_segment(&path).unwrap_or("-").to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        error!(%method, path, session, status = status.as_u16(), elapsed_ms, "request failed");
    } else if status.is_client_error() {
        warn!(%method, path, session, status = status.as_u16(), elapsed_ms, "request rejected");
    } else {
        info!(%method, path, session, status = status.as_u16(), elapsed_ms, "request served");
    }

    response
}

fn session_segment(path: &str) -> Option<&str> {
    let mut segments = path.split('/').skip_while(|s| *s != "sessions");
    segments.next()?;
    segments.next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_segment() {
        assert_eq!(
            session_segment("/api/v1/sessions/abc/chat"),
            Some("abc")
        );
        assert_eq!(session_segment("/api/v1/sessions"), None);
        assert_eq!(session_segment("/health"), None);
    }
}
