// Domain Layer - Drying lifecycle entities and pure rules

pub mod deadline;
pub mod error;
pub mod history;
pub mod item;
pub mod order;

// Re-exports
pub use deadline::SweepClock;
pub use error::DomainError;
pub use history::{latest_per_item, DryingWindow, HistoryFilter, HistoryId, HistoryRecord};
pub use item::{Item, ItemId, ItemStatus, MiteScore, UserId};
pub use order::{Order, OrderId, OrderStatus};
