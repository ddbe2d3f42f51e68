//! Application services and ports.

#![forbid(unsafe_code)]

mod replication_ports;
mod replication_service;

pub use replication_ports::{
    AuditTrailRepository, ProjectKeyResolver, PromotionExecutor, PromotionRecordWriter,
};
pub use replication_service::{
    DEFAULT_PROJECT_KEY, ReplicationOutcome, ReplicationRequest, ReplicationService,
};
