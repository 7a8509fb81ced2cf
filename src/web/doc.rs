use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::{AUTH_HEADER, AUTH_TOKEN};

pub struct SessionAuthModifier;

impl Modify for SessionAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
            schema.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    AUTH_HEADER,
                    "JWT token sent by the studio client",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::account_signup_handler,
        crate::web::routes::account::account_signin_handler,
        crate::web::routes::account::account_me_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::course_modules_list_handler,
        crate::web::routes::courses::course_modules_create_handler,
        crate::web::routes::courses::course_tree_handler,
        crate::web::routes::modules::modules_update_handler,
        crate::web::routes::modules::modules_delete_handler,
        crate::web::routes::items::items_create_handler,
        crate::web::routes::items::items_get_handler,
        crate::web::routes::items::items_update_handler,
        crate::web::routes::items::items_delete_handler,
        crate::web::routes::items::items_reorder_handler,
        crate::web::routes::media::media_upload_handler,
        crate::web::routes::content::content_tabs_handler,
        crate::web::routes::content::content_list_handler,
        crate::web::routes::player::player_course_handler,
        crate::web::routes::player::player_complete_handler,
    ),
    modifiers(&SessionAuthModifier),
    tags(
        (name = "account", description = "Sign up, sign in and current user"),
        (name = "studio", description = "Course authoring"),
        (name = "player", description = "Learner course view and completion"),
    )
)]
pub struct ApiDoc;
