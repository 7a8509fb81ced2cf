use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    model::{
        Capability, CrudRepository, ResourceTyped,
        entity::{Item, ItemCreate, ItemUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::common::{CreatedResponse, ReorderRequest, SuccessResponse},
        error::ErrorResponse,
        middlewares,
        routes::require_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/items", post(items_create_handler))
        .route(
            "/items/{id}",
            get(items_get_handler)
                .put(items_update_handler)
                .delete(items_delete_handler),
        )
        .route("/reorder", post(items_reorder_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn require_item(state: &AppState, user: &AuthenticatedUser, id: i64) -> WebResult<Item> {
    Item::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Item::get_resource_type()))
}

#[utoipa::path(
    post,
    path = "/api/v1/studio/items",
    request_body = ItemCreate,
    description = "Creates an item at the end of its module unless `menu_order` is given",
    responses(
        (status = 200, description = "Item created", body = CreatedResponse),
        (status = 400, description = "Title missing or module outside the course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn items_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ItemCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    if payload.course_id > 0 {
        require_course(&state, user, payload.course_id).await?;
    }

    let created = Item::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CreatedResponse::new(created.id()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Full item payload", body = Item),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn items_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let item = require_item(&state, user, id).await?;

    Ok((StatusCode::OK, Json(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/studio/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = ItemUpdate,
    description = "Partial update. Upsell fields are ignored without the manage_upsell capability",
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Title empty or module outside the course", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn items_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let item = require_item(&state, user, id).await?;

    let updated = item
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/studio/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    description = "Moves the item to the trash",
    responses(
        (status = 200, description = "Item trashed", body = SuccessResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn items_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let item = require_item(&state, user, id).await?;

    item.delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    tracing::info!(item_id = id, "item trashed");
    Ok((StatusCode::OK, Json(SuccessResponse::ok())))
}

#[utoipa::path(
    post,
    path = "/api/v1/studio/reorder",
    request_body = ReorderRequest,
    description = "Sets `menu_order` to each item's position. The list must be a permutation of the module's items",
    responses(
        (status = 200, description = "Order saved", body = SuccessResponse),
        (status = 400, description = "Empty list or not a permutation", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn items_reorder_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    require_course(&state, user, payload.course_id).await?;

    Item::reorder(
        state.pool(),
        user,
        payload.course_id,
        payload.module_id,
        &payload.ordered_item_ids,
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(SuccessResponse::ok())))
}
