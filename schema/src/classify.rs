//! Custom-vs-residual field classification.

use prost_reflect::{Kind, MessageDescriptor};

use crate::CustomFieldType;

/// A custom-encoded field: its field number and on-stream type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomFieldDescr {
    pub field_num: u32,
    pub field_type: CustomFieldType,
}

/// The field partition derived from a message descriptor.
///
/// `custom` is sorted ascending by field number; `residual` keeps descriptor
/// order and is handled by the diff-marshal proto path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldClassification {
    pub custom: Vec<CustomFieldDescr>,
    pub residual: Vec<u32>,
}

impl FieldClassification {
    /// Returns the largest custom field number, or zero if there are none.
    #[must_use]
    pub fn max_custom_field_num(&self) -> u32 {
        self.custom.last().map_or(0, |descr| descr.field_num)
    }

    /// Returns the custom type id for a field number, if any.
    #[must_use]
    pub fn custom_type_for(&self, field_num: u32) -> Option<CustomFieldType> {
        self.custom
            .iter()
            .find(|descr| descr.field_num == field_num)
            .map(|descr| descr.field_type)
    }
}

/// Partitions the fields of `message` into custom-coded and residual sets.
#[must_use]
pub fn classify(message: &MessageDescriptor) -> FieldClassification {
    let mut classification = FieldClassification::default();
    classify_into(message, &mut classification);
    classification
}

/// Like [`classify`], reusing the allocations already held by `out`.
///
/// Invoked on every effective schema change; the previous partition is
/// discarded but its buffers are kept.
pub fn classify_into(message: &MessageDescriptor, out: &mut FieldClassification) {
    out.custom.clear();
    out.residual.clear();

    for field in message.fields() {
        match custom_type_of(&field) {
            Some(field_type) => out.custom.push(CustomFieldDescr {
                field_num: field.number(),
                field_type,
            }),
            None => out.residual.push(field.number()),
        }
    }

    out.custom.sort_by_key(|descr| descr.field_num);
}

fn custom_type_of(field: &prost_reflect::FieldDescriptor) -> Option<CustomFieldType> {
    if field.is_list() || field.is_map() {
        return None;
    }
    match field.kind() {
        Kind::Double | Kind::Float => Some(CustomFieldType::Float),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Some(CustomFieldType::SignedInt64),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Some(CustomFieldType::SignedInt32),
        Kind::Uint64 | Kind::Fixed64 => Some(CustomFieldType::UnsignedInt64),
        Kind::Uint32 | Kind::Fixed32 => Some(CustomFieldType::UnsignedInt32),
        Kind::String | Kind::Bytes => Some(CustomFieldType::Bytes),
        Kind::Bool => Some(CustomFieldType::Bool),
        Kind::Message(_) | Kind::Enum(_) => None,
    }
}
