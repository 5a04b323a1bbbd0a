//! Schema descriptors: a message descriptor plus a deploy identity.

use prost_reflect::{DescriptorPool, MessageDescriptor};

use crate::error::{SchemaError, SchemaResult};

/// An opaque schema handle for the encoder.
///
/// Wraps the message descriptor that samples must conform to, together with a
/// stable deploy id. Two descriptors with the same non-empty deploy id are
/// treated as wire-compatible, so setting one over the other is a no-op.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    deploy_id: String,
    message: MessageDescriptor,
}

impl SchemaDescriptor {
    /// Creates a descriptor from an already-resolved message descriptor.
    #[must_use]
    pub fn new(message: MessageDescriptor, deploy_id: impl Into<String>) -> Self {
        Self {
            deploy_id: deploy_id.into(),
            message,
        }
    }

    /// Resolves a descriptor from an encoded `FileDescriptorSet` and a
    /// fully-qualified message name.
    ///
    /// This is the path a schema registry delivers schemas through: the
    /// serialized descriptor set bytes plus the name of the message to bind.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DescriptorDecode`] if the bytes are not a valid
    /// descriptor set, and [`SchemaError::MessageNotFound`] if the named
    /// message is absent.
    pub fn from_file_descriptor_set(
        bytes: &[u8],
        message_name: &str,
        deploy_id: impl Into<String>,
    ) -> SchemaResult<Self> {
        let pool = DescriptorPool::decode(bytes).map_err(|err| SchemaError::DescriptorDecode {
            cause: err.to_string(),
        })?;
        let message =
            pool.get_message_by_name(message_name)
                .ok_or_else(|| SchemaError::MessageNotFound {
                    name: message_name.to_string(),
                })?;
        Ok(Self::new(message, deploy_id))
    }

    /// Returns the deploy id. An empty id never matches another descriptor.
    #[must_use]
    pub fn deploy_id(&self) -> &str {
        &self.deploy_id
    }

    /// Returns the message descriptor samples must conform to.
    #[must_use]
    pub fn message(&self) -> &MessageDescriptor {
        &self.message
    }

    /// Returns `true` if both descriptors carry the same non-empty deploy id.
    #[must_use]
    pub fn same_deploy(&self, other: &SchemaDescriptor) -> bool {
        !other.deploy_id.is_empty() && self.deploy_id == other.deploy_id
    }
}
