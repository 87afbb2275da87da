pub mod api_key;
pub mod crud;
pub mod organization;
pub mod user;
pub mod website_config;
