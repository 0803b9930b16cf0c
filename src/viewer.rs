// Request-scoped caller identity, resolved upstream by the auth gateway.
// The gateway validates credentials and injects `x-viewer-id`; this layer
// only reads its verdict and never touches credentials itself.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::error::AppError;

/// The resolved caller of a request: an authenticated user id, or anonymous.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub user_id: Option<i64>,
}

impl ViewerContext {
    pub fn authenticated(user_id: i64) -> Self {
        ViewerContext {
            user_id: Some(user_id),
        }
    }

    pub fn anonymous() -> Self {
        ViewerContext { user_id: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns the caller's user id, or Unauthorized for anonymous viewers.
    /// Every mutating route calls this before reaching the service layer.
    pub fn require_authenticated(&self) -> Result<i64, AppError> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

const VIEWER_HEADER: &str = "x-viewer-id";

impl<S> FromRequestParts<S> for ViewerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(VIEWER_HEADER) {
            Some(value) => {
                let user_id = value
                    .to_str()
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("invalid {} header", VIEWER_HEADER))
                    })?;
                Ok(ViewerContext::authenticated(user_id))
            }
            None => Ok(ViewerContext::anonymous()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_viewer_is_rejected_for_mutations() {
        let viewer = ViewerContext::anonymous();
        assert!(!viewer.is_authenticated());
        assert!(viewer.require_authenticated().is_err());
    }

    #[test]
    fn authenticated_viewer_resolves_id() {
        let viewer = ViewerContext::authenticated(42);
        assert_eq!(viewer.require_authenticated().unwrap(), 42);
    }
}
