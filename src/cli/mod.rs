pub mod app_config;
pub mod env_config;
