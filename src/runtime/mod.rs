//! Asynchronous lifecycle runtime called into by synthesized wrappers.

pub mod data_plane;
pub mod guard;
pub mod handler;
pub mod i18n;
pub mod latency;
pub mod machine;
pub mod route_loader;

pub use data_plane::{use_data_plane, DataPlane, Registry};
pub use guard::StaleGuard;
pub use handler::{operation, AsyncError, AsyncHandler, HandlerStatus, Operation};
pub use i18n::{localize, resolve_locale_url, Lookup, Messages, TranslationCache, TranslationMap};
pub use latency::{Latency, Settlement, WeakLatency};
pub use machine::{LatencyContext, LatencyEvent, LatencyMachine, LatencyState};
pub use route_loader::{RouteLoader, RouteParams};
