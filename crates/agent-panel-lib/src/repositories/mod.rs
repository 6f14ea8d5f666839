// Repository Layer
// Provides data access over the host key-value store

pub mod config_repo;

pub use config_repo::ConfigRepository;
