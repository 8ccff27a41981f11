//! Core domain types shared across the pipeline.

pub mod ids;

pub use ids::{RoomId, RouteName, TransactionId};
