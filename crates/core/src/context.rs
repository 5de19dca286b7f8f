//! Caller context: identity claims forwarded by the gateway for one request.
//!
//! The holder is a tokio task-local. A request handler runs inside
//! [`scope`], which makes the context visible to everything awaited on that
//! task (handlers, repositories, the audit fill handler) and drops it once the
//! scoped future finishes, however it finishes.
//!
//! Work moved onto another task (`tokio::spawn`, `spawn_blocking`) does not
//! inherit the context; clone it and pass it explicitly, or re-enter [`scope`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim key that carries the caller's user name.
pub const USER_NAME_CLAIM: &str = "user_name";

tokio::task_local! {
    static CALLER: CallerContext;
}

/// Claims describing the caller of the current request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerContext {
    claims: Map<String, Value>,
}

impl CallerContext {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Build a context from the raw `x-client-token-user` header value.
    ///
    /// Absent, blank, malformed, or non-object input yields an empty context.
    pub fn from_header(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Self::default(),
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(claims)) => Self { claims },
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "caller claims header is not a JSON object; ignoring");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "caller claims header is not valid JSON; ignoring");
                Self::default()
            }
        }
    }

    /// The `user_name` claim, if present and a non-blank string.
    pub fn username(&self) -> Option<&str> {
        self.claims
            .get(USER_NAME_CLAIM)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Run `fut` with `ctx` as the current caller context.
pub async fn scope<F>(ctx: CallerContext, fut: F) -> F::Output
where
    F: Future,
{
    CALLER.scope(ctx, fut).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<R>(ctx: CallerContext, f: impl FnOnce() -> R) -> R {
    CALLER.sync_scope(ctx, f)
}

/// The current caller context, or an empty one outside any [`scope`].
pub fn current() -> CallerContext {
    CALLER.try_with(Clone::clone).unwrap_or_default()
}

/// The current caller's user name, if any.
pub fn current_username() -> Option<String> {
    CALLER
        .try_with(|ctx| ctx.username().map(str::to_owned))
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn ctx_for(user: &str) -> CallerContext {
        CallerContext::from_header(Some(&json!({ "user_name": user }).to_string()))
    }

    #[test]
    fn parses_object_claims() {
        let ctx = CallerContext::from_header(Some(r#"{"user_name":"alice","dept":"ops","level":3}"#));
        assert_eq!(ctx.username(), Some("alice"));
        assert_eq!(ctx.claim("dept"), Some(&json!("ops")));
        assert_eq!(ctx.claim("level"), Some(&json!(3)));
    }

    #[test]
    fn absent_blank_and_malformed_headers_yield_empty_context() {
        for raw in [None, Some(""), Some("   "), Some("{not json"), Some("[1,2]"), Some("\"alice\"")] {
            let ctx = CallerContext::from_header(raw);
            assert!(ctx.is_empty(), "expected empty context for {raw:?}");
            assert_eq!(ctx.username(), None);
        }
    }

    #[test]
    fn missing_or_blank_user_name_is_tolerated() {
        let ctx = CallerContext::from_header(Some(r#"{"dept":"ops"}"#));
        assert!(!ctx.is_empty());
        assert_eq!(ctx.username(), None);

        let ctx = CallerContext::from_header(Some(r#"{"user_name":"  "}"#));
        assert_eq!(ctx.username(), None);

        let ctx = CallerContext::from_header(Some(r#"{"user_name":42}"#));
        assert_eq!(ctx.username(), None);
    }

    #[test]
    fn reads_outside_scope_are_empty() {
        assert_eq!(current(), CallerContext::default());
        assert_eq!(current_username(), None);
    }

    #[test]
    fn sync_scope_sets_and_clears() {
        let seen = sync_scope(ctx_for("bob"), current_username);
        assert_eq!(seen.as_deref(), Some("bob"));
        assert_eq!(current_username(), None);
    }

    #[tokio::test]
    async fn scope_clears_after_completion() {
        let seen = scope(ctx_for("alice"), async { current_username() }).await;
        assert_eq!(seen.as_deref(), Some("alice"));
        assert_eq!(current(), CallerContext::default());
    }

    #[tokio::test]
    async fn scope_clears_after_error() {
        let result: Result<(), &str> = scope(ctx_for("alice"), async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(current_username(), None);
    }

    #[tokio::test]
    async fn concurrent_scopes_are_isolated() {
        let run = |user: &'static str| {
            tokio::spawn(scope(ctx_for(user), async move {
                let mut observed = Vec::new();
                for _ in 0..20 {
                    observed.push(current_username());
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                observed
            }))
        };

        let (a, b) = tokio::join!(run("alice"), run("bob"));
        assert!(a.unwrap().iter().all(|u| u.as_deref() == Some("alice")));
        assert!(b.unwrap().iter().all(|u| u.as_deref() == Some("bob")));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: arbitrary header input never panics and only objects produce claims.
            #[test]
            fn header_parsing_is_total(raw in ".{0,64}") {
                let ctx = CallerContext::from_header(Some(&raw));
                let is_object = matches!(serde_json::from_str::<Value>(raw.trim()), Ok(Value::Object(_)));
                if !is_object {
                    prop_assert!(ctx.is_empty());
                }
            }

            /// Property: any non-blank string user name round-trips through the header.
            #[test]
            fn user_name_round_trips(name in "[A-Za-z][A-Za-z0-9_.-]{0,31}") {
                let ctx = ctx_for(&name);
                prop_assert_eq!(ctx.username(), Some(name.as_str()));
            }
        }
    }
}
