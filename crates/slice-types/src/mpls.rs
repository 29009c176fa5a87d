//! MPLS label values.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-bit MPLS label.
///
/// Labels are scoped per device: the same value on two devices means two
/// unrelated bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MplsLabel(u32);

impl MplsLabel {
    /// Largest encodable label value (2^20 - 1).
    pub const MAX_VALUE: u32 = 1_048_575;

    pub fn new(value: u32) -> Result<Self, ParseError> {
        if value > Self::MAX_VALUE {
            return Err(ParseError::InvalidMplsLabel(value));
        }
        Ok(MplsLabel(value))
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MplsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for MplsLabel {
    type Error = ParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        MplsLabel::new(value)
    }
}

impl From<MplsLabel> for u32 {
    fn from(label: MplsLabel) -> u32 {
        label.0
    }
}
