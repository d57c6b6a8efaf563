//! Failure logs carry the request they belong to.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use legitima_auth::{GoogleProvider, OAuthConfig, SessionCodec};
use legitima_directory::MemoryDirectory;
use legitima_server::{router, AppState, DEFAULT_LOG_FILTER};
use std::io;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_server_error_log_names_the_path() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let _guard = tracing_subscriber::registry()
        .with(EnvFilter::new(DEFAULT_LOG_FILTER))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        )
        .set_default();

    let codec = SessionCodec::with_secret("test-secret").unwrap();
    let token = codec.issue("ghost@example.com").unwrap();
    let provider = GoogleProvider::new(OAuthConfig::google(
        "client-id",
        "client-secret",
        "http://localhost:8080/callback",
    ))
    .unwrap();
    let state = AppState::new(codec, Arc::new(provider), Arc::new(MemoryDirectory::new()));

    let response = router(Arc::new(state))
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, format!("Authorization={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let output = logs.contents();
    let failure = output
        .lines()
        .find(|line| line.contains("Request failed"))
        .unwrap_or_else(|| panic!("no failure line in:\n{}", output));
    assert!(failure.contains("ERROR"));
    assert!(failure.contains("uri=/profile"), "{}", failure);
    assert!(failure.contains("status=500"));
}
