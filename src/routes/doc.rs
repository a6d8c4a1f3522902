use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            ApplyActionRequest, AttachmentRequest, CreateOrderRequest, OrderList,
            UpdateClientOrderRequest, UpdateOrderDetailsRequest,
        },
        payments::{
            CreatePaymentRequest, CreatePaymentResponse, OrderPaymentStatusResponse,
            SubscriptionStatusResponse, UpdateOrderPaymentStatusRequest, WebhookPayload,
            WebhookResponse,
        },
    },
    domain::order_status::OrderStatus,
    models::{
        AppSettings, ClientProfile, CustomerConnection, Design, Measurements, Order, Subscription,
        TailorProfile, User,
    },
    plans::SubscriptionPlan,
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, connections, designs, health, orders, payments, profiles, settings, uploads,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::apply_action,
        orders::update_details,
        orders::update_client_order,
        orders::add_attachment,
        orders::remove_attachment,
        designs::list_public,
        designs::list_mine,
        designs::get_public,
        designs::create_design,
        designs::update_design,
        designs::delete_design,
        profiles::get_client_profile,
        profiles::upsert_client_profile,
        profiles::update_measurements,
        profiles::get_tailor_profile,
        profiles::upsert_tailor_profile,
        profiles::list_tailors,
        connections::create_connection,
        connections::list_connections,
        connections::update_connection_status,
        payments::list_plans,
        payments::create_payment,
        payments::subscription_status,
        payments::webhook,
        payments::update_order_payment_status,
        payments::order_payment_status,
        uploads::generate_signature,
        uploads::cloudinary_status,
        uploads::test_config,
        settings::get_settings,
        settings::update_settings,
        admin::list_users,
        admin::set_role,
        admin::check_admin,
        admin::list_all_orders,
        admin::force_order_status,
        admin::list_subscriptions,
        admin::toggle_subscription
    ),
    components(
        schemas(
            User,
            Order,
            OrderStatus,
            Design,
            ClientProfile,
            TailorProfile,
            Measurements,
            CustomerConnection,
            Subscription,
            SubscriptionPlan,
            AppSettings,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateOrderRequest,
            ApplyActionRequest,
            UpdateOrderDetailsRequest,
            UpdateClientOrderRequest,
            AttachmentRequest,
            OrderList,
            designs::CreateDesignRequest,
            designs::UpdateDesignRequest,
            designs::DesignList,
            profiles::ClientProfileRequest,
            profiles::TailorProfileRequest,
            profiles::TailorProfileList,
            connections::CreateConnectionRequest,
            connections::UpdateConnectionRequest,
            connections::ConnectionList,
            CreatePaymentRequest,
            CreatePaymentResponse,
            WebhookPayload,
            WebhookResponse,
            UpdateOrderPaymentStatusRequest,
            OrderPaymentStatusResponse,
            SubscriptionStatusResponse,
            uploads::SignatureRequest,
            uploads::SignatureResponse,
            uploads::ServiceStatus,
            uploads::ConfigCheckResponse,
            settings::UpdateSettingsRequest,
            admin::SetRoleRequest,
            admin::AdminCheckResponse,
            admin::ForceOrderStatusRequest,
            admin::ToggleSubscriptionRequest,
            admin::UserList,
            health::HealthResponse,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<Design>,
            ApiResponse<designs::DesignList>,
            ApiResponse<User>,
            ApiResponse<AppSettings>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "orders", description = "Order lifecycle"),
        (name = "designs", description = "Design catalogue"),
        (name = "profiles", description = "Client and tailor profiles"),
        (name = "connections", description = "Client-tailor pairing"),
        (name = "payments", description = "Subscriptions and payments"),
        (name = "uploads", description = "Cloudinary signed uploads"),
        (name = "settings", description = "Application settings"),
        (name = "admin", description = "Moderation endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
