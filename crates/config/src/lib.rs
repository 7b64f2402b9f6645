//! Configuration: schema, discovery, `${ENV}` substitution and environment overrides.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{AccessConfig, DispatchConfig, PesanConfig, ServerConfig, WhatsAppConfig},
};
