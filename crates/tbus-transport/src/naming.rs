//! ---
//! tbus_section: "04-messaging-transport"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Messaging node interface and in-process publish/subscribe bus."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Name rules shared by topics and services.
//!
//! A valid name is non-empty and contains no whitespace, no `@`, no `~` and
//! no empty path segment (`//`). Names are otherwise passed through verbatim.

use crate::TransportError;

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| c.is_whitespace() || c == '@' || c == '~')
        && !name.contains("//")
}

/// Check a topic name.
pub fn validate_topic(topic: &str) -> Result<(), TransportError> {
    if is_valid_name(topic) {
        Ok(())
    } else {
        Err(TransportError::InvalidTopic(topic.to_owned()))
    }
}

/// Check a service name.
pub fn validate_service(service: &str) -> Result<(), TransportError> {
    if is_valid_name(service) {
        Ok(())
    } else {
        Err(TransportError::InvalidService(service.to_owned()))
    }
}
