// src/docs.rs
//
// OpenAPI description of the HTTP API, served under /api/docs.

use axum::{
    Json, Router,
    response::{Html, IntoResponse},
    routing::get,
};
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

use crate::{
    handlers::{auth, courses, modules, users},
    models::{
        module::{ModuleOrder, ReorderRequest},
        user::{BalanceIncrementRequest, LoginRequest, RegisterRequest, UpdateUserRequest},
    },
    state::AppState,
};

/// Multipart fields of course creation and update.
/// Every field is required on creation and optional on update.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CourseForm {
    title: String,
    description: String,
    instructor: String,
    /// Decimal with at most two places, e.g. `49.99`.
    price: String,
    /// Comma separated or a JSON array of strings.
    topics: String,
    #[schema(format = Binary)]
    thumbnail_image: Option<String>,
}

/// Multipart fields of module creation and update. Both files are optional.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ModuleForm {
    title: String,
    description: String,
    #[schema(format = Binary)]
    pdf_content: Option<String>,
    #[schema(format = Binary)]
    video_content: Option<String>,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                Http::builder()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Coursehub API",
        description = "Course marketplace: accounts, catalog, purchases, modules and progress."
    ),
    tags(
        (name = "auth", description = "Registration, login and the caller's profile"),
        (name = "courses", description = "Catalog, purchases and ownership"),
        (name = "modules", description = "Course modules and completion"),
        (name = "users", description = "Admin user management")
    ),
    paths(
        auth::register,
        auth::login,
        auth::get_self,
        courses::list_courses,
        courses::list_my_courses,
        courses::get_course,
        courses::create_course,
        courses::update_course,
        courses::delete_course,
        courses::buy_course,
        courses::buy_status,
        modules::list_course_modules,
        modules::create_module,
        modules::reorder_modules,
        modules::get_module,
        modules::update_module,
        modules::delete_module,
        modules::complete_module,
        users::list_users,
        users::get_user,
        users::increment_balance,
        users::update_user,
        users::delete_user,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        UpdateUserRequest,
        BalanceIncrementRequest,
        ReorderRequest,
        ModuleOrder,
        CourseForm,
        ModuleForm,
    ))
)]
pub struct ApiDoc;

const SWAGGER_PAGE: &str = r##"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Coursehub API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: "/api/docs/openapi.json", dom_id: "#swagger-ui" });
    </script>
  </body>
</html>
"##;

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn swagger_page() -> impl IntoResponse {
    Html(SWAGGER_PAGE)
}

/// Public routes: the Swagger UI page and the JSON document it loads.
pub fn docs_routes() -> Router<AppState> {
    Router::new()
        .route("/docs", get(swagger_page))
        .route("/docs/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_auth() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/register",
            "/api/courses",
            "/api/courses/{id}/buy",
            "/api/courses/{id}/modules/reorder",
            "/api/modules/{id}/complete",
            "/api/users/{id}/balance",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{} missing", path);
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn balance_increment_is_a_number() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let increment = &json["components"]["schemas"]["BalanceIncrementRequest"]["properties"]
            ["increment"];
        assert_eq!(increment["type"], "number");
    }
}
