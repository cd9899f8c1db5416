//! Request-scoped correlation context.

use tracing::Span;
use uuid::Uuid;

/// A correlation context carried across a logical turn's lifetime, used to
/// open a `tracing` span with stable fields (request id, component,
/// operation) so log lines from every stage of a turn can be joined back
/// together.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    component: String,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a new context for `component`, minting a fresh request id.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            component: component.into(),
            operation: None,
        }
    }

    /// Attach an explicit operation name (e.g. `"process_request"`).
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The request id carried by this context.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Build the `tracing` span for this context. Entering it (directly, or
    /// via [`RequestContext::enter`]) attaches `request_id`/`component`/
    /// `operation` to every log event emitted inside.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or("-"),
        )
    }

    /// Enter this context's span for the lifetime of the returned guard.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// A drop guard holding a [`RequestContext`]'s span entered.
pub struct RequestGuard {
    _entered: tracing::span::EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_contexts_get_distinct_request_ids() {
        let a = RequestContext::new("gateway");
        let b = RequestContext::new("gateway");
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn entering_the_span_does_not_panic() {
        let ctx = RequestContext::new("gateway").with_operation("process_request");
        let _guard = ctx.enter();
    }
}
