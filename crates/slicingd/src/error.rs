//! Error types for slicingd.

use slice_dataplane::DataplaneError;
use slice_types::{DeviceId, Ipv4Prefix, NetworkId, ParseError};
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors surfaced by the slicing engine and daemon.
///
/// Classification failures on the packet path are not errors; they are
/// reported as drop reasons. These variants cover resource failures,
/// management requests that cannot be honoured, and startup problems.
#[derive(Debug, Error)]
pub enum SlicingError {
    /// The device has issued every label up to 2^20-1 and none were returned.
    #[error("label space exhausted on device {0}")]
    LabelSpaceExhausted(DeviceId),

    #[error("no flow {src} -> {dst} in network {network}")]
    FlowNotFound {
        network: NetworkId,
        src: Ipv4Addr,
        dst: Ipv4Addr,
    },

    /// Routed network whose gateway is outside its own prefix.
    #[error("gateway {gateway} is not inside {cidr}")]
    InvalidRoutedNetwork { cidr: Ipv4Prefix, gateway: Ipv4Addr },

    /// Links handed to the path builder do not form a chain between the hosts.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("tenant directory error: {0}")]
    Directory(String),

    #[error("dataplane error: {0}")]
    Dataplane(#[from] DataplaneError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for slicingd operations.
pub type Result<T> = std::result::Result<T, SlicingError>;
