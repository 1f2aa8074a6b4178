//! MQTT Adapters
//!
//! The forwarder that bridges the quote channel onto the bus, and the
//! validating builder that assembles it.

mod builder;
mod forwarder;

pub use builder::{BuilderError, ForwarderBuilder, DEFAULT_MQTT_PORT};
pub use forwarder::{Forwarder, ForwarderError};

use rumqttc::QoS;

/// Map a config-file QoS number onto the protocol level.
///
/// Out-of-range values settle on at-least-once.
pub(crate) fn qos_level(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_levels_map_onto_protocol() {
        assert_eq!(qos_level(0), QoS::AtMostOnce);
        assert_eq!(qos_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_level(2), QoS::ExactlyOnce);
        assert_eq!(qos_level(7), QoS::AtLeastOnce);
    }
}
