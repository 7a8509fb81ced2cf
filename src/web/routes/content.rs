use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    model::{
        Capability, ResourceTyped,
        entity::{CONTENT_LISTING_LIMIT, Item, ItemType},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::tree::{ContentEntry, ContentQuery, ContentTab},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/content-tabs", get(content_tabs_handler))
        .route("/content", get(content_list_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/content-tabs",
    description = "Item types with at least one item outside the trash",
    responses(
        (status = 200, description = "Tabs with labels", body = Vec<ContentTab>),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn content_tabs_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let types = Item::types_present(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    let tabs: Vec<ContentTab> = types.into_iter().map(ContentTab::from).collect();
    Ok((StatusCode::OK, Json(tabs)))
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/content",
    params(ContentQuery),
    description = "Newest items of one type across all courses",
    responses(
        (status = 200, description = "Items of the type", body = Vec<ContentEntry>),
        (status = 400, description = "Unknown type", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn content_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let item_type = match query.item_type.as_deref().map(str::trim) {
        None | Some("") => {
            return Err(WebError::resource_bad_request(
                Item::get_resource_type(),
                "an item type is required",
            ));
        }
        Some(raw) => raw
            .parse::<ItemType>()
            .map_err(|reason| WebError::resource_bad_request(Item::get_resource_type(), reason))?,
    };

    let items = Item::list_by_type(state.pool(), user, item_type, CONTENT_LISTING_LIMIT)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    let entries: Vec<ContentEntry> = items.iter().map(ContentEntry::from).collect();
    Ok((StatusCode::OK, Json(entries)))
}
