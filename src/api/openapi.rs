use crate::api::handlers::{auth, health, root};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// `OpenAPI` document served at `/api-docs/openapi.json` and through the
/// Swagger UI. Add new endpoints to `paths(...)` so they stay documented.
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::manual::signup,
        auth::manual::login,
        auth::reconcile::provider_login,
        auth::provision::provider_register,
        auth::session::me,
        auth::session::logout,
    ),
    components(schemas(
        health::Health,
        auth::types::Role,
        auth::types::SignupRequest,
        auth::types::SignupResponse,
        auth::types::LoginRequest,
        auth::types::TokenResponse,
        auth::types::RoleRequiredResponse,
        auth::types::ProviderRegisterRequest,
        auth::types::ProfileResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "belezo", description = "Salon booking identity API"),
        (name = "auth", description = "Identity reconciliation and session issuance"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by `security(("bearer" = []))`.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
