//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use tracing::trace;

/// Direction of bus traffic, used for consistent logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficDirection {
    /// Message handed to the bus by a publisher.
    Outbound,
    /// Message delivered to a subscription callback.
    Inbound,
    /// Service request handed to a provider.
    Request,
    /// Service reply returned to the caller.
    Reply,
}

/// Emit a structured trace entry for bus traffic.
pub fn log_traffic(direction: TrafficDirection, name: &str, msg_type: &str, bytes: usize) {
    trace!(
        direction = ?direction,
        name,
        msg_type,
        bytes,
        "bus traffic"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_without_subscriber() {
        log_traffic(TrafficDirection::Outbound, "/foo", "tbus.msgs.StringMsg", 12);
        log_traffic(TrafficDirection::Reply, "/echo", "tbus.msgs.Int32", 0);
    }
}
