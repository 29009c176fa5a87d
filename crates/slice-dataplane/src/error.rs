//! Southbound error types.

use crate::types::FlowRuleId;
use slice_types::{ConnectPoint, DeviceId};
use thiserror::Error;

/// Error returned by frame decoding and by platform implementations of the
/// southbound traits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataplaneError {
    /// Frame shorter than the header it claims to carry.
    #[error("truncated {layer} header: need {needed} bytes, have {available}")]
    Truncated {
        layer: &'static str,
        needed: usize,
        available: usize,
    },

    /// Header present but its fields are not valid for this codec.
    #[error("malformed {layer} header: {reason}")]
    Malformed { layer: &'static str, reason: String },

    /// The device is not known to the platform.
    #[error("device {0} is not reachable")]
    DeviceUnreachable(DeviceId),

    /// The output port does not exist on the device.
    #[error("no such port {0}")]
    PortNotFound(ConnectPoint),

    /// Removal of a rule the device does not hold.
    #[error("flow rule {id} not installed on {device}")]
    RuleNotFound { id: FlowRuleId, device: DeviceId },

    /// The device refused the rule.
    #[error("device {device} rejected flow rule: {reason}")]
    Rejected { device: DeviceId, reason: String },
}

impl DataplaneError {
    pub fn malformed(layer: &'static str, reason: impl Into<String>) -> Self {
        DataplaneError::Malformed {
            layer,
            reason: reason.into(),
        }
    }

    /// Returns true for decode failures (as opposed to device failures).
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            DataplaneError::Truncated { .. } | DataplaneError::Malformed { .. }
        )
    }
}

/// Result type for southbound operations.
pub type DataplaneResult<T> = Result<T, DataplaneError>;
