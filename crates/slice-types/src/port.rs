//! Port numbers and device attachment points.

use crate::{DeviceId, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A port number on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(u32);

impl PortNumber {
    pub const fn new(number: u32) -> Self {
        PortNumber(number)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(PortNumber)
            .map_err(|_| ParseError::InvalidPortNumber(s.to_string()))
    }
}

impl From<u32> for PortNumber {
    fn from(number: u32) -> Self {
        PortNumber(number)
    }
}

/// A (device, port) attachment point.
///
/// Rendered as `<device>/<port>`. Device identifiers may themselves contain
/// `:` (e.g. `of:0000000000000001`), so parsing splits on the last `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectPoint {
    pub device: DeviceId,
    pub port: PortNumber,
}

impl ConnectPoint {
    pub fn new(device: DeviceId, port: impl Into<PortNumber>) -> Self {
        Self {
            device,
            port: port.into(),
        }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

impl FromStr for ConnectPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (device, port) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidConnectPoint(s.to_string()))?;
        let device: DeviceId = device
            .parse()
            .map_err(|_| ParseError::InvalidConnectPoint(s.to_string()))?;
        let port: PortNumber = port
            .parse()
            .map_err(|_| ParseError::InvalidConnectPoint(s.to_string()))?;
        Ok(Self { device, port })
    }
}

impl TryFrom<String> for ConnectPoint {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ConnectPoint> for String {
    fn from(point: ConnectPoint) -> String {
        point.to_string()
    }
}
