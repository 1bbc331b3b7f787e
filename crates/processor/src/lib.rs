//! Command processing pipeline for the ledger command core.
//!
//! Orchestrates validate → execute → append as one atomic unit of work per
//! command: idempotency cache in front, optimistic-concurrency retry around
//! the append, leader coordination wrapping the whole pipeline, and outbound
//! publication after a durable append.

pub mod config;
pub mod consensus;
pub mod error;
pub mod idempotency;
pub mod processor;
pub mod publisher;
pub mod replay;
pub mod service;

pub use config::ProcessorConfig;
pub use consensus::{Coordination, LocalCoordinator, NodeId};
pub use error::ProcessorError;
pub use idempotency::IdempotencyCache;
pub use processor::CommandProcessor;
pub use publisher::{EventPublisher, InMemoryEventPublisher, LoggingEventPublisher, PublishError};
pub use replay::ReplayService;
pub use service::AccountService;
