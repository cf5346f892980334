//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::{debug, error};

use crate::descriptor::MessageDescriptor;
use crate::{builtin, DynamicMessage, FactoryError};

static BUILTIN: Lazy<MessageFactory> = Lazy::new(MessageFactory::with_builtin_types);

/// Registry mapping type names to descriptors.
///
/// Names are resolved against canonical type names first and aliases second.
/// Messages created through the factory always carry the canonical name.
#[derive(Debug, Clone, Default)]
pub struct MessageFactory {
    types: IndexMap<String, Arc<MessageDescriptor>>,
    aliases: HashMap<String, String>,
}

impl MessageFactory {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in catalogue.
    pub fn with_builtin_types() -> Self {
        let mut factory = Self::new();
        if let Err(err) = builtin::install(&mut factory) {
            error!(error = %err, "failed to install built-in message types");
        }
        factory
    }

    /// Shared registry holding only the built-in catalogue.
    pub fn builtin() -> &'static MessageFactory {
        &BUILTIN
    }

    /// Register a descriptor under its canonical type name.
    pub fn register(&mut self, descriptor: Arc<MessageDescriptor>) -> Result<(), FactoryError> {
        let name = descriptor.type_name().to_owned();
        if self.is_taken(&name) {
            return Err(FactoryError::DuplicateType(name));
        }
        debug!(type_name = %name, fields = descriptor.fields().len(), "registered message type");
        self.types.insert(name, descriptor);
        Ok(())
    }

    /// Make `alias` resolve to the already registered `canonical` type.
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        canonical: &str,
    ) -> Result<(), FactoryError> {
        let alias = alias.into();
        if !self.types.contains_key(canonical) {
            return Err(FactoryError::UnknownType(canonical.to_owned()));
        }
        if self.is_taken(&alias) {
            return Err(FactoryError::DuplicateType(alias));
        }
        self.aliases.insert(alias, canonical.to_owned());
        Ok(())
    }

    fn is_taken(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Look up a descriptor by canonical name or alias.
    pub fn resolve(&self, type_name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.types.get(type_name).or_else(|| {
            self.aliases
                .get(type_name)
                .and_then(|canonical| self.types.get(canonical))
        })
    }

    /// Whether `type_name` resolves.
    pub fn contains(&self, type_name: &str) -> bool {
        self.resolve(type_name).is_some()
    }

    /// Canonical type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.keys().map(String::as_str)
    }

    /// Create a message of `type_name`, initialised from a text-format payload.
    ///
    /// `None` and an empty payload both yield an empty message.
    pub fn new_message(
        &self,
        type_name: &str,
        payload: Option<&str>,
    ) -> Result<DynamicMessage, FactoryError> {
        let descriptor = self
            .resolve(type_name)
            .ok_or_else(|| FactoryError::UnknownType(type_name.to_owned()))?;
        let mut message = DynamicMessage::new(Arc::clone(descriptor));
        if let Some(payload) = payload {
            message
                .merge_text(payload)
                .map_err(|source| FactoryError::InvalidPayload {
                    type_name: descriptor.type_name().to_owned(),
                    source,
                })?;
        }
        Ok(message)
    }

    /// Decode bytes produced by [`DynamicMessage::encode`].
    pub fn decode(&self, type_name: &str, bytes: &[u8]) -> Result<DynamicMessage, FactoryError> {
        let descriptor = self
            .resolve(type_name)
            .ok_or_else(|| FactoryError::UnknownType(type_name.to_owned()))?;
        DynamicMessage::decode(Arc::clone(descriptor), bytes)
    }
}
