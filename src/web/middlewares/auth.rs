use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    auth::{self, CryptError},
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

/// Cookie set on sign-in.
pub static AUTH_TOKEN: &str = "SID";
/// Header the studio client sends on every request.
pub static AUTH_HEADER: &str = "x-nexus-token";

/// Resolves the caller from the token header, falling back to the cookie.
/// Requests without a token continue anonymously.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let header_token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (source, token) = match (header_token, cookies.get(AUTH_TOKEN)) {
        (Some(token), _) => (AUTH_HEADER, token),
        (None, Some(cookie)) => (AUTH_TOKEN, cookie.value().to_string()),
        (None, None) => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let claims = auth::process_token(&token, state.jwt())
        .map_err(|e| WebError::auth_token_invalid(source, e.into()))?;

    let id = claims.claims.sub.parse::<i64>().map_err(|_| {
        WebError::auth_token_invalid(source, CryptError::InvalidSubject(claims.claims.sub.clone()))
    })?;

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let ctx = match user {
        Some(user) => RequestContext::new(Some(user.as_actor())),
        None => RequestContext::new(None),
    };
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
