use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::put,
};

use crate::{
    model::{
        Capability, CrudRepository, ResourceTyped,
        entity::{GENERAL_MODULE_ID, Module, ModuleUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{common::SuccessResponse, tree::ModuleSummary},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/modules/{id}",
            put(modules_update_handler).delete(modules_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn require_module(state: &AppState, user: &AuthenticatedUser, id: i64) -> WebResult<Module> {
    if id == GENERAL_MODULE_ID {
        return Err(WebError::resource_bad_request(
            Module::get_resource_type(),
            "The general module cannot be changed.",
        ));
    }

    Module::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Module::get_resource_type()))
}

#[utoipa::path(
    put,
    path = "/api/v1/studio/modules/{id}",
    params(("id" = i64, Path, description = "Module id")),
    request_body = ModuleUpdate,
    description = "Renames a module. Its course never changes",
    responses(
        (status = 200, description = "Module renamed", body = ModuleSummary),
        (status = 400, description = "Name missing or module is the general bucket", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn modules_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ModuleUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let module = require_module(&state, user, id).await?;

    let updated = module
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(ModuleSummary::from(&updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/studio/modules/{id}",
    params(("id" = i64, Path, description = "Module id")),
    description = "Deletes a module. Its items move to the general bucket",
    responses(
        (status = 200, description = "Module deleted", body = SuccessResponse),
        (status = 400, description = "Module is the general bucket", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn modules_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let module = require_module(&state, user, id).await?;

    module
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    tracing::info!(module_id = id, "module deleted");
    Ok((StatusCode::OK, Json(SuccessResponse::ok())))
}
