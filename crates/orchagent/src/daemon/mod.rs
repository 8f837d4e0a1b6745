//! OrchDaemon - the central event loop coordinating all registered Orchs.

mod orchdaemon;

pub use orchdaemon::{OrchDaemon, OrchDaemonConfig};
