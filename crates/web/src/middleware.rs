use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use aurora_core::{CallerContext, context};

/// Credential forwarded by the gateway for service-to-service calls.
pub const X_CLIENT_TOKEN: &str = "x-client-token";

/// JSON object of caller claims forwarded by the gateway, e.g.
/// `{"user_name": "alice", "dept": "ops"}`.
pub const X_CLIENT_TOKEN_USER: &str = "x-client-token-user";

/// Populate the caller context from gateway headers for the rest of the stack.
///
/// The context is available both as `Extension<CallerContext>` and through
/// [`aurora_core::context::current`]. It is cleared once the inner service has
/// produced its response, including translated error responses.
pub async fn user_context_middleware(mut req: Request, next: Next) -> Response {
    check_token(header_str(req.headers(), X_CLIENT_TOKEN));

    let ctx = CallerContext::from_header(header_str(req.headers(), X_CLIENT_TOKEN_USER));
    req.extensions_mut().insert(ctx.clone());

    context::scope(ctx, next.run(req)).await
}

/// Gateway token check.
///
/// Tokens are validated upstream; once that is wired in, claims in
/// `x-client-token-user` can be trusted. Until then this only records whether a
/// token was presented and never rejects.
pub fn check_token(token: Option<&str>) {
    tracing::debug!(present = token.is_some(), "client token check skipped");
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
}
