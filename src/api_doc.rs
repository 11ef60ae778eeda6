use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Get or create components section
        let components = openapi.components.get_or_insert_with(Default::default);

        // Add bearer token security scheme
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Narcotics Map Backend API",
        version = "0.1.0",
        description = "REST API for the drug-prone location map and its admin back office"
    ),
    paths(
        // Health
        crate::routes::health::health_check,
        // Authentication and admin management
        crate::auth::controller::login,
        crate::auth::controller::register,
        crate::auth::controller::me,
        crate::auth::controller::list_users,
        crate::auth::controller::update_user,
        crate::auth::controller::delete_user,
        crate::auth::controller::reset_password,
        // Banner
        crate::banner::controller::get_active,
        crate::banner::controller::list,
        crate::banner::controller::save,
        crate::banner::controller::patch,
        crate::banner::controller::delete,
        // Logo
        crate::logo::controller::get_active,
        crate::logo::controller::list,
        crate::logo::controller::save,
        crate::logo::controller::patch,
        crate::logo::controller::delete,
        // Locations
        crate::location::controller::list,
        crate::location::controller::statistics,
        crate::location::controller::get,
        crate::location::controller::create,
        crate::location::controller::update,
        crate::location::controller::delete,
        // News
        crate::news::controller::list,
        crate::news::controller::get,
        crate::news::controller::create,
        crate::news::controller::update,
        crate::news::controller::delete,
        // Notifications
        crate::notification::controller::list,
        crate::notification::controller::count_unread,
        crate::notification::controller::mark_read,
        crate::notification::controller::mark_all_read
    ),
    components(
        schemas(
            // Shared schemas
            crate::response::ErrorBody,
            crate::schema_ext::DateTimeWrapper,
            // Health schemas
            crate::routes::health::HealthResponse,
            crate::routes::health::HealthServices,
            // Auth schemas
            crate::auth::controller::LoginRequest,
            crate::auth::controller::RegisterRequest,
            crate::auth::controller::UpdateUserRequest,
            crate::auth::controller::ResetPasswordRequest,
            crate::auth::controller::LoginResponse,
            crate::auth::service::AdminRecord,
            // Banner schemas
            crate::banner::model::BannerResponse,
            crate::banner::model::ImagePosition,
            crate::banner::model::PatchBannerRequest,
            // Logo schemas
            crate::logo::model::Logo,
            crate::logo::model::PatchLogoRequest,
            // Location schemas
            crate::location::model::Location,
            crate::location::model::CreateLocationRequest,
            crate::location::model::UpdateLocationRequest,
            crate::location::model::NeighborhoodStat,
            // News schemas
            crate::news::model::NewsResponse,
            crate::news::model::Pagination,
            crate::news::controller::NewsListResponse,
            // Notification schemas
            crate::notification::model::Notification,
            crate::notification::model::NotificationKind,
            crate::notification::controller::UnreadCount
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "authentication", description = "Login and admin account management"),
        (name = "banner", description = "Homepage banner management"),
        (name = "logo", description = "Agency logo management"),
        (name = "locations", description = "Drug-prone map locations"),
        (name = "news", description = "News article management"),
        (name = "notifications", description = "Admin notification inbox")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
