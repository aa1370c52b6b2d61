//! OpenAPI documentation.
//!
//! [`ApiDoc`] is the served document. It describes the root routes (`/health`, `/graphql`,
//! `/uploads/*`) and nests [`V1ApiDoc`], whose paths are written relative to `/api/v1` in the
//! handler annotations.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, db, sync};

/// Registers the `BearerAuth` scheme referenced by protected handlers
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Session token returned by `/api/v1/auth/login`. Send it in the `Authorization` header:\n\n\
                        ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                    ))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::auth::update_profile,
        api::handlers::auth::change_password,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        api::handlers::blog::list_posts,
        api::handlers::blog::get_post,
        api::handlers::blog::list_categories,
        api::handlers::projects::list_projects,
        api::handlers::projects::get_project,
        api::handlers::products::list_products,
        api::handlers::products::get_product,
        api::handlers::products::list_categories,
        api::handlers::wallet::get_wallet,
        api::handlers::wallet::list_transactions,
        api::handlers::wallet::create_deposit,
        api::handlers::wallet::deposit_callback,
        api::handlers::wallet::get_points,
        api::handlers::orders::create_order,
        api::handlers::orders::list_my_orders,
        api::handlers::orders::get_order,
        api::handlers::orders::pay_order,
        api::handlers::uploads::upload_image,
        api::handlers::uploads::upload_file,
        api::handlers::uploads::upload_multiple,
        api::handlers::wordpress::webhook,
        // Admin
        api::handlers::admin::admin_login,
        api::handlers::admin::dashboard_stats,
        api::handlers::admin::recent_activity,
        api::handlers::admin::list_users,
        api::handlers::admin::get_user,
        api::handlers::admin::create_user,
        api::handlers::admin::update_user,
        api::handlers::admin::delete_user,
        api::handlers::admin::update_user_role,
        api::handlers::blog::admin_list_posts,
        api::handlers::blog::admin_get_post,
        api::handlers::blog::create_post,
        api::handlers::blog::update_post,
        api::handlers::blog::delete_post,
        api::handlers::blog::create_category,
        api::handlers::projects::admin_list_projects,
        api::handlers::projects::create_project,
        api::handlers::projects::update_project,
        api::handlers::projects::delete_project,
        api::handlers::products::admin_list_products,
        api::handlers::products::create_product,
        api::handlers::products::update_product,
        api::handlers::products::delete_product,
        api::handlers::products::create_category,
        api::handlers::orders::admin_list_orders,
        api::handlers::orders::update_order_status,
        api::handlers::wordpress::list_sites,
        api::handlers::wordpress::create_site,
        api::handlers::wordpress::test_site,
        api::handlers::wordpress::sync_site,
        api::handlers::wordpress::push_to_site,
        api::handlers::wordpress::list_sync_logs,
    ),
    components(
        schemas(
            api::models::envelope::ApiErrorBody,
            api::models::pagination::PaginationMeta,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::ChangePasswordRequest,
            api::models::auth::ForgotPasswordRequest,
            api::models::auth::ForgotPasswordResponse,
            api::models::auth::ResetPasswordRequest,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::AdminUserCreate,
            api::models::users::AdminUserUpdate,
            api::models::users::RoleUpdate,
            api::models::users::ProfileUpdate,
            api::models::admin::DashboardStats,
            api::models::admin::ActivityItem,
            api::models::blog::BlogPostCreate,
            api::models::blog::BlogPostUpdate,
            api::models::blog::AuthorSummary,
            api::models::blog::BlogPostResponse,
            api::models::blog::BlogCategoryCreate,
            api::models::blog::BlogCategoryResponse,
            api::models::projects::ProjectRequest,
            api::models::projects::ProjectResponse,
            api::models::products::ProductRequest,
            api::models::products::ProductResponse,
            api::models::products::ProductCategoryCreate,
            api::models::products::ProductCategoryResponse,
            api::models::orders::OrderItemRequest,
            api::models::orders::OrderCreate,
            api::models::orders::OrderStatusUpdate,
            api::models::orders::OrderItemResponse,
            api::models::orders::OrderResponse,
            api::models::orders::PaymentResponse,
            api::models::wallet::PaymentMethod,
            api::models::wallet::WalletResponse,
            api::models::wallet::WalletTransactionResponse,
            api::models::wallet::DepositRequest,
            api::models::wallet::DepositResponse,
            api::models::wallet::DepositCallback,
            api::models::wallet::PointsResponse,
            api::models::wallet::PointTransactionResponse,
            api::models::uploads::UploadResponse,
            api::models::uploads::MultiUploadResponse,
            api::models::wordpress::WordPressSiteCreate,
            api::models::wordpress::WordPressSiteResponse,
            api::models::wordpress::SyncLogResponse,
            api::models::wordpress::WebhookPayload,
            db::models::blog::PostStatus,
            db::models::projects::ProjectStatus,
            db::models::orders::OrderStatus,
            db::models::orders::PaymentStatus,
            db::models::wallets::WalletTransactionType,
            db::models::wallets::WalletTransactionStatus,
            db::models::points::PointTransactionType,
            db::models::wordpress::SyncStatus,
            db::models::wordpress::SyncType,
            sync::wordpress::SyncSummary,
            sync::wordpress::PushResult,
        )
    ),
    tags(
        (name = "auth", description = "Registration, sessions and password management"),
        (name = "blog", description = "Published blog posts and categories"),
        (name = "projects", description = "Portfolio projects"),
        (name = "products", description = "Software catalog"),
        (name = "wallet", description = "Wallet balance, deposits and loyalty points"),
        (name = "orders", description = "Orders and wallet checkout"),
        (name = "uploads", description = "File uploads"),
        (name = "wordpress", description = "WordPress site connections and content sync"),
        (name = "admin", description = "Administration (admin role required)"),
    )
)]
pub struct V1ApiDoc;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ZPlus API",
        description = "Accounts, published content, commerce with a wallet ledger, and WordPress sync. \
                       REST responses under `/api/v1` use the `{success, message, data?, error?}` envelope."
    ),
    modifiers(&SecurityAddon),
    nest(
        (path = "/api/v1", api = V1ApiDoc)
    ),
    paths(
        api::handlers::health::health,
        api::handlers::graphql::graphql,
        api::handlers::uploads::serve_upload,
    ),
    components(
        schemas(
            api::models::health::HealthResponse,
            api::models::graphql::GraphQLRequest,
            api::models::graphql::GraphQLResponse,
            api::models::graphql::GraphQLError,
            api::models::graphql::GraphQLUser,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "graphql", description = "User directory over GraphQL"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_nests_versioned_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/graphql"));
        assert!(doc.paths.paths.contains_key("/api/v1/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/wordpress/sites/{id}/sync"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
