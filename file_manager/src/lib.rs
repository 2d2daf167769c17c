pub mod ia_config;
pub mod netrc;
pub mod serde_support;
