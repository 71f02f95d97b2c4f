//! Tower Layer implementation for the permission gate

use std::sync::Arc;
use tower::Layer;

use super::service::RequirePermission;
use crate::gate::Authorizer;

/// Tower Layer that admits only requests granted one permission
///
/// # Example
///
/// ```rust,ignore
/// use tower::ServiceBuilder;
/// use patisserie_auth::tower::RequirePermissionLayer;
///
/// let service = ServiceBuilder::new()
///     .layer(RequirePermissionLayer::new(authorizer, "post:drinks"))
///     .service(my_inner_service);
/// ```
#[derive(Debug, Clone)]
pub struct RequirePermissionLayer {
    authorizer: Authorizer,
    permission: Arc<str>,
}

impl RequirePermissionLayer {
    /// Gate on `permission`; an empty string only requires a verified token
    /// with a `permissions` claim
    pub fn new(authorizer: Authorizer, permission: impl Into<Arc<str>>) -> Self {
        Self {
            authorizer,
            permission: permission.into(),
        }
    }

    /// The permission this layer enforces
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermission<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermission::new(inner, self.authorizer.clone(), Arc::clone(&self.permission))
    }
}
