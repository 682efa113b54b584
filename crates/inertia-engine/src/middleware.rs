//! Asset version guard.
//!
//! In-protocol navigations carrying a stale asset version are answered with
//! `409 Conflict` and `X-Inertia-Location`, which makes the client do a full
//! page load and pick up the new assets. Only safe reads are redirected;
//! mutating requests go through so a submitted action is never lost.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{ready, Either, Ready};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use inertia_core::{client_version, header_names, is_inertia_request, request_url};
use tower::{Layer, Service};
use tracing::{info, warn};

/// Layer producing [`VersionGuard`].
#[derive(Debug, Clone)]
pub struct VersionGuardLayer {
    url: Arc<str>,
    version: Arc<str>,
}

impl VersionGuardLayer {
    /// Guard against versions other than `version`; reload targets are
    /// `url` followed by the request URI.
    pub fn new(url: &str, version: &str) -> Self {
        Self {
            url: url.into(),
            version: version.into(),
        }
    }
}

impl<S> Layer<S> for VersionGuardLayer {
    type Service = VersionGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        VersionGuard {
            inner,
            url: self.url.clone(),
            version: self.version.clone(),
        }
    }
}

/// Service answering stale in-protocol reads with a forced reload.
#[derive(Debug, Clone)]
pub struct VersionGuard<S> {
    inner: S,
    url: Arc<str>,
    version: Arc<str>,
}

impl<S> VersionGuard<S> {
    /// Where to send the client, if this request must reload.
    fn reload_location<B>(&self, req: &Request<B>) -> Option<String> {
        if !is_inertia_request(req.headers()) || !is_safe_read(req.method()) {
            return None;
        }
        if client_version(req.headers()).unwrap_or_default() == &*self.version {
            return None;
        }
        Some(format!("{}{}", self.url, request_url(req.uri())))
    }
}

impl<S, ReqB, ResB> Service<Request<ReqB>> for VersionGuard<S>
where
    S: Service<Request<ReqB>, Response = Response<ResB>>,
    ResB: Default,
{
    type Response = Response<ResB>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Self::Response, Self::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[tracing::instrument(
        name = "inertia.version_guard",
        skip_all,
        fields(method = %req.method(), uri = %req.uri())
    )]
    fn call(&mut self, req: Request<ReqB>) -> Self::Future {
        match self.reload_location(&req) {
            Some(location) => {
                info!(
                    client_version = client_version(req.headers()).unwrap_or_default(),
                    version = %self.version,
                    location = %location,
                    "Asset version changed, forcing reload"
                );
                Either::Left(ready(Ok(conflict(&location))))
            }
            None => Either::Right(self.inner.call(req)),
        }
    }
}

fn is_safe_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn conflict<B: Default>(location: &str) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::CONFLICT;
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(header_names::X_INERTIA_LOCATION, value);
        }
        Err(e) => warn!(location, error = %e, "Reload target is not a valid header value"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::{service_fn, ServiceExt};

    const URL: &str = "https://shop.test";
    const VERSION: &str = "abc123";

    /// Run one request through the guard; returns the response and whether
    /// the inner handler ran.
    async fn call(req: Request<()>) -> (Response<String>, bool) {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let handler = service_fn(move |_req: Request<()>| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, Infallible>(Response::new("handled".to_string())) }
        });

        let response = VersionGuardLayer::new(URL, VERSION)
            .layer(handler)
            .oneshot(req)
            .await
            .unwrap();
        (response, called.load(Ordering::SeqCst))
    }

    fn inertia(method: Method, uri: &str, version: Option<&str>) -> Request<()> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Inertia", "true");
        if let Some(version) = version {
            builder = builder.header("X-Inertia-Version", version);
        }
        builder.body(()).unwrap()
    }

    // === Pass-through Tests ===

    #[tokio::test]
    async fn test_plain_request_passes() {
        let req = Request::builder().uri("/users").body(()).unwrap();
        let (response, called) = call(req).await;

        assert!(called);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "handled");
    }

    #[tokio::test]
    async fn test_matching_version_passes() {
        let (response, called) = call(inertia(Method::GET, "/users", Some(VERSION))).await;

        assert!(called);
        assert!(response.headers().get("X-Inertia-Location").is_none());
    }

    #[tokio::test]
    async fn test_post_with_stale_version_passes() {
        let (response, called) = call(inertia(Method::POST, "/users", Some("old"))).await;

        assert!(called);
        assert_eq!(response.status(), StatusCode::OK);
    }

    // === Forced Reload Tests ===

    #[tokio::test]
    async fn test_get_with_stale_version_reloads() {
        let (response, called) = call(inertia(Method::GET, "/users?page=2", Some("old"))).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers()["X-Inertia-Location"],
            "https://shop.test/users?page=2"
        );
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_missing_version_reloads() {
        let (response, called) = call(inertia(Method::GET, "/", None)).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_head_is_a_safe_read() {
        let (response, called) = call(inertia(Method::HEAD, "/", Some("old"))).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_is_safe_read() {
        assert!(is_safe_read(&Method::GET));
        assert!(is_safe_read(&Method::HEAD));
        assert!(!is_safe_read(&Method::POST));
        assert!(!is_safe_read(&Method::PUT));
        assert!(!is_safe_read(&Method::DELETE));
    }
}
