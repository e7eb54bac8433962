pub mod access;
pub mod config;

pub use access::ChainAccess;
pub use config::{ChainConfig, ChainPaths};
