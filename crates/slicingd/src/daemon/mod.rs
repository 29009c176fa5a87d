//! Daemon loop driving the registered orchs.

mod slicedaemon;

pub use slicedaemon::{SliceDaemon, SliceDaemonConfig};
