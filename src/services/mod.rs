pub mod admin_service;
pub mod auth_service;
pub mod connection_service;
pub mod design_service;
pub mod order_service;
pub mod payment_service;
pub mod profile_service;
pub mod settings_service;
