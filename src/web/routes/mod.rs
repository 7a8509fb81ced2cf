use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::model::{CrudRepository, ResourceTyped, entity::Course};
use crate::web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc};

pub mod account;
pub mod content;
pub mod courses;
pub mod items;
pub mod media;
pub mod modules;
pub mod player;

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState, docs: bool) -> Router<S> {
    let studio = Router::new()
        .merge(courses::routes(state.clone()))
        .merge(modules::routes(state.clone()))
        .merge(items::routes(state.clone()))
        .merge(media::routes(state.clone()))
        .merge(content::routes(state.clone()));

    let mut router = Router::new()
        .nest("/api/v1/account", account::routes(state.clone()))
        .nest("/api/v1/studio", studio)
        .nest("/api/v1", player::routes(state.clone()))
        .nest_service("/api/v1/static", ServeDir::new(state.uploads_dir()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if docs {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

/// Course outside the trash, or 404.
pub(crate) async fn require_course(
    state: &AppState,
    user: &AuthenticatedUser,
    course_id: i64,
) -> WebResult<Course> {
    Course::find_by_id(state.pool(), user, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}
