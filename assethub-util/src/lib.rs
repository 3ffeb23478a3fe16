pub mod config;
pub mod crypto;
pub mod fs;
pub mod http;
pub mod sas;
pub mod store;
pub mod types;
