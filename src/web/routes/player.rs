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
        entity::{Completion, Course, Item, Module, PostStatus},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::player::{CompleteResponse, PlayerCourse, PlayerLesson, group_lessons},
        error::ErrorResponse,
        middlewares,
        routes::require_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/course/{id}", get(player_course_handler))
        .route("/lesson/{id}/complete", post(player_complete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/course/{id}",
    params(("id" = i64, Path, description = "Course id")),
    description = "Published lessons grouped by module, with the caller's completion flags",
    responses(
        (status = 200, description = "Course structure", body = PlayerCourse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found or not published", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "player",
    security(("cookie" = []), ("token" = []))
)]
async fn player_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = require_course(&state, user, id).await?;
    // authors may preview drafts
    if course.status() != PostStatus::Publish && !user.can(Capability::UseStudio) {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }

    let modules = Module::list_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;
    let items = Item::list_published_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;
    let completion = Completion::for_user(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Completion::get_resource_type(), e))?;

    let lessons = items
        .iter()
        .map(|item| (item.module_id(), PlayerLesson::from_item(item, &completion)));

    let body = PlayerCourse {
        id: course.id(),
        title: course.title().to_string(),
        modules: group_lessons(&modules, lessons),
        total_completed: completion.lessons().len() as i64,
    };

    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lesson/{id}/complete",
    params(("id" = i64, Path, description = "Lesson id")),
    description = "Flips the caller's completion flag for a lesson",
    responses(
        (status = 200, description = "New completion state", body = CompleteResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "player",
    security(("cookie" = []), ("token" = []))
)]
async fn player_complete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exists = Item::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?
        .is_some();

    if !exists {
        return Err(WebError::resource_not_found(Item::get_resource_type()));
    }

    let toggle = Completion::toggle(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Completion::get_resource_type(), e))?;

    tracing::debug!(lesson_id = id, completed = toggle.is_completed, "completion toggled");
    Ok((StatusCode::OK, Json(CompleteResponse::from(toggle))))
}
