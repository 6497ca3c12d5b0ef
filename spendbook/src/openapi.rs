//! OpenAPI documentation for the expense tracker API, served at `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Spendbook API",
        description = "Personal expense tracking with cookie-based JWT authentication. \
            All expense operations are scoped to the authenticated user."
    ),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::refresh_token,
        api::handlers::expenses::list_expenses,
        api::handlers::expenses::create_expense,
        api::handlers::expenses::update_expense,
        api::handlers::expenses::delete_expense,
    ),
    tags(
        (name = "authentication", description = "Register, login, logout and token refresh"),
        (name = "expenses", description = "Expense management for the authenticated user"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_contains_all_routes() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;

        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/refresh-token",
            "/api/expenses",
            "/api/expenses/{id}",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }
}
