pub mod reconciler;
pub mod stream_registry;
pub mod notification_dispatcher;
pub mod stream_tracker;

pub use notification_dispatcher::{DispatchReport, NotificationDispatcher};
pub use reconciler::{reconcile, PolicyTable, ReconcilePolicy, Reconciliation, StopClamp, Transition};
pub use stream_registry::StreamRegistry;
pub use stream_tracker::{StreamTracker, TrackOutcome, TrackerConfig};
