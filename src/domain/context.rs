//! Request Context
//!
//! Who is calling and how to correlate their request in logs.

use uuid::Uuid;

use super::Principal;

/// Context for a request, inserted into request extensions by the auth layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Caller resolved from the X-API-Key header
    pub principal: Principal,

    /// Correlation ID for request tracing
    pub correlation_id: Option<Uuid>,
}

impl RequestContext {
    /// Create a context for an anonymous caller
    pub fn new() -> Self {
        Self {
            principal: Principal::Anonymous,
            correlation_id: None,
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
