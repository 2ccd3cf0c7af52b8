//! Consumer module for the change-event queue.
//!
//! Decodes queued messages into change events for the orchestrator.

mod messages;

pub use messages::{
    BatchItemFailure, BatchResponse, ChangeEvent, ChangeMethod, QueueMessage, RELAY_SOURCE,
};
