use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    auth::{self, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::account::{Credentials, MeResponse, SessionResponse},
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
    },
};

const MIN_PASSWORD_LEN: usize = 6;

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(account_me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(account_signup_handler))
        .route("/signin", post(account_signin_handler))
        .merge(protected)
        .with_state(state)
}

fn start_session(state: &AppState, cookies: &Cookies, user: UserEntity) -> WebResult<SessionResponse> {
    let token = auth::issue_token(user.id(), state.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token.clone());
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);

    Ok(SessionResponse { user, token })
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = Credentials,
    description = "Creates a member account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = SessionResponse),
        (status = 400, description = "Username or password rejected", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
#[tracing::instrument(skip_all, fields(username = %payload.username))]
async fn account_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<Credentials>,
) -> WebResult<impl IntoResponse> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(WebError::registration_invalid("username is required."));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(WebError::registration_invalid(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let created = UserEntity::create(
        state.pool(),
        &admin,
        UserEntityCreate {
            username,
            password_hash: hash,
            role: UserRole::Member,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    tracing::info!(user_id = created.id(), "account created");
    let session = start_session(&state, &cookies, created)?;
    Ok((StatusCode::OK, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = Credentials,
    responses(
        (status = 200, description = "User signed in", body = SessionResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
#[tracing::instrument(skip_all, fields(username = %payload.username))]
async fn account_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<Credentials>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, payload.username.trim())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::auth_invalid_credentials())?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    let session = start_session(&state, &cookies, found)?;
    Ok((StatusCode::OK, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Current user and the capabilities the studio gates on",
    responses(
        (status = 200, description = "Signed-in user", body = MeResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = []),
        ("token" = [])
    )
)]
async fn account_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::auth_required())?;

    Ok((StatusCode::OK, Json(MeResponse::from(&found))))
}
