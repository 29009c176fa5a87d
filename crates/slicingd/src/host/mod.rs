//! Host learning, ARP answering and routed-network lookup.

mod resolver;
mod routed;

pub use resolver::{ForwardRequest, HostResolver, Resolution, DEFAULT_GATEWAY_MAC};
pub use routed::{RoutedNetwork, RoutedNetworks};
