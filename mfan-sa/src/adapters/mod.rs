//! Reference collaborator implementations driven by the TOML config

pub mod config_registry;
pub mod http_source;
pub mod policy_provider;
pub mod signed_auth;

pub use config_registry::ConfigSourceRegistry;
pub use http_source::HttpSourceAdapter;
pub use policy_provider::{FilePolicyProvider, StaticPolicyProvider};
pub use signed_auth::SignedHeaderAuthenticator;
