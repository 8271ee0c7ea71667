// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod lifecycle;
pub mod notify;
pub mod shutdown;
pub mod sweep;

// Re-exports
pub use lifecycle::{LifecycleService, OrderCompletion};
pub use notify::OwnerNotifier;
pub use shutdown::{shutdown_channel, ShutdownToken, ShutdownTrigger};
pub use sweep::{
    DryingStores, ReconcileGate, SweepConfig, SweepEngine, SweepKind, SweepReport, SweepScheduler,
};
