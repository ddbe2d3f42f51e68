//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_lifecycle_client;
mod jfrog_cli_promotion_executor;

pub use http_lifecycle_client::HttpLifecycleClient;
pub use jfrog_cli_promotion_executor::JfrogCliPromotionExecutor;
