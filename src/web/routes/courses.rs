use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    model::{
        Capability, CrudRepository, ResourceTyped,
        entity::{Course, CourseCreate, CourseUpdate, Item, Module, ModuleCreate, ModuleUpdate},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::{
            common::{CreatedResponse, SuccessResponse},
            courses::{CourseDetail, CourseSummary},
            tree::{CourseTree, ModuleSummary},
        },
        error::ErrorResponse,
        middlewares,
        routes::require_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/courses/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route(
            "/courses/{id}/modules",
            get(course_modules_list_handler).post(course_modules_create_handler),
        )
        .route("/courses/{id}/items", get(course_tree_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/courses",
    description = "Every course outside the trash, newest first",
    responses(
        (status = 200, description = "Courses collected", body = Vec<CourseSummary>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn courses_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let courses = Course::list_active(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let summaries: Vec<CourseSummary> = courses.iter().map(CourseSummary::from).collect();
    Ok((StatusCode::OK, Json(summaries)))
}

#[utoipa::path(
    post,
    path = "/api/v1/studio/courses",
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course created", body = CreatedResponse),
        (status = 400, description = "Title missing or cover unknown", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CreatedResponse::new(created.id()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let course = require_course(&state, user, id).await?;

    Ok((StatusCode::OK, Json(CourseDetail::from(&course))))
}

#[utoipa::path(
    put,
    path = "/api/v1/studio/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    request_body = CourseUpdate,
    description = "Partial update. Absent fields are kept, `cover_id: 0` removes the cover",
    responses(
        (status = 200, description = "Course updated", body = CourseDetail),
        (status = 400, description = "Title empty or cover unknown", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CourseUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let course = require_course(&state, user, id).await?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CourseDetail::from(&updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/studio/courses/{id}",
    params(("id" = i64, Path, description = "Course id")),
    description = "Moves the course to the trash",
    responses(
        (status = 200, description = "Course trashed", body = SuccessResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    let course = require_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!(course_id = id, "course trashed");
    Ok((StatusCode::OK, Json(SuccessResponse::ok())))
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/courses/{id}/modules",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Modules of the course, by name", body = Vec<ModuleSummary>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn course_modules_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    require_course(&state, user, id).await?;

    let modules = Module::list_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    let summaries: Vec<ModuleSummary> = modules.iter().map(ModuleSummary::from).collect();
    Ok((StatusCode::OK, Json(summaries)))
}

#[utoipa::path(
    post,
    path = "/api/v1/studio/courses/{id}/modules",
    params(("id" = i64, Path, description = "Course id")),
    request_body = ModuleUpdate,
    responses(
        (status = 200, description = "Module created", body = CreatedResponse),
        (status = 400, description = "Name missing", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn course_modules_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ModuleUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    require_course(&state, user, id).await?;

    let created = Module::create(
        state.pool(),
        user,
        ModuleCreate {
            course_id: id,
            name: payload.name,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CreatedResponse::new(created.id()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/studio/courses/{id}/items",
    params(("id" = i64, Path, description = "Course id")),
    description = "Modules with their items. The general bucket (id 0) is always last",
    responses(
        (status = 200, description = "Course tree", body = CourseTree),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn course_tree_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;
    require_course(&state, user, id).await?;

    let modules = Module::list_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;
    let items = Item::list_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Item::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CourseTree::from_entities(&modules, &items))))
}
