pub mod cert_verifier;
pub mod client_config;
