//! Tower Service implementation for the permission gate
//!
//! Works with any `http::Request<B>` service whose response body can be built
//! from a `String`, which covers axum handlers and routers.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;
use tracing::debug;

use crate::gate::Authorizer;

/// Tower Service that authorizes each request before forwarding it
///
/// On success the [`VerifiedClaims`](crate::VerifiedClaims) are placed in the
/// request's extensions.
#[derive(Debug, Clone)]
pub struct RequirePermission<S> {
    inner: S,
    authorizer: Authorizer,
    permission: Arc<str>,
}

impl<S> RequirePermission<S> {
    /// Create a new gated service
    pub fn new(inner: S, authorizer: Authorizer, permission: Arc<str>) -> Self {
        Self {
            inner,
            authorizer,
            permission,
        }
    }

    /// The permission this service enforces
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// Get a reference to the inner service
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Future type for gated responses
pub type RequirePermissionFuture<T, E> = BoxFuture<'static, Result<T, E>>;

impl<S, B, ResBody> Service<http::Request<B>> for RequirePermission<S>
where
    S: Service<http::Request<B>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
    ResBody: From<String>,
{
    type Response = http::Response<ResBody>;
    type Error = S::Error;
    type Future = RequirePermissionFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        // Take the readied service and leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authorizer = self.authorizer.clone();
        let permission = Arc::clone(&self.permission);

        Box::pin(async move {
            let outcome = authorizer
                .authorize_headers(req.headers(), &permission)
                .await;

            match outcome {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(e) => {
                    debug!(
                        method = %req.method(),
                        path = req.uri().path(),
                        permission = %permission,
                        code = e.code(),
                        status = e.status().as_u16(),
                        "Request rejected"
                    );
                    Ok(e.failure().into_http_response())
                }
            }
        })
    }
}
