//! Shared test fixtures: runtime-built descriptors and annotations.
#![allow(dead_code)]

use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};
use schema::SchemaDescriptor;

pub fn field(name: &str, number: i32, typ: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(typ as i32),
        ..Default::default()
    }
}

pub fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, Type::Message)
    }
}

pub fn pool_with_messages(messages: Vec<DescriptorProto>) -> DescriptorPool {
    let file = FileDescriptorProto {
        name: Some("test.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: messages,
        ..Default::default()
    };
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
        .expect("valid test descriptor set")
}

fn nested_proto() -> DescriptorProto {
    DescriptorProto {
        name: Some("Nested".to_string()),
        field: vec![field("inner", 1, Type::Int64)],
        ..Default::default()
    }
}

/// `test.Sample`: `1: double a, 2: sint64 b, 3: bytes c, 4: bool d,
/// 5: test.Nested e`.
pub fn sample_descriptor() -> MessageDescriptor {
    let sample = DescriptorProto {
        name: Some("Sample".to_string()),
        field: vec![
            field("a", 1, Type::Double),
            field("b", 2, Type::Sint64),
            field("c", 3, Type::Bytes),
            field("d", 4, Type::Bool),
            message_field("e", 5, ".test.Nested"),
        ],
        ..Default::default()
    };
    pool_with_messages(vec![nested_proto(), sample])
        .get_message_by_name("test.Sample")
        .expect("test.Sample registered")
}

pub fn sample_schema(deploy_id: &str) -> SchemaDescriptor {
    SchemaDescriptor::new(sample_descriptor(), deploy_id)
}

/// Wire bytes for a `test.Sample` message.
pub fn sample_annotation(a: f64, b: i64, c: &[u8], d: bool, e_inner: i64) -> Vec<u8> {
    let desc = sample_descriptor();
    let nested_desc = desc
        .parent_pool()
        .get_message_by_name("test.Nested")
        .expect("test.Nested registered");

    let mut msg = DynamicMessage::new(desc);
    msg.set_field_by_number(1, Value::F64(a));
    msg.set_field_by_number(2, Value::I64(b));
    msg.set_field_by_number(3, Value::Bytes(bytes::Bytes::copy_from_slice(c)));
    msg.set_field_by_number(4, Value::Bool(d));
    let mut nested = DynamicMessage::new(nested_desc);
    nested.set_field_by_number(1, Value::I64(e_inner));
    msg.set_field_by_number(5, Value::Message(nested));
    msg.encode_to_vec()
}

/// `test.BytesOnly`: `3: bytes c` and nothing else.
pub fn bytes_only_descriptor() -> MessageDescriptor {
    let message = DescriptorProto {
        name: Some("BytesOnly".to_string()),
        field: vec![field("c", 3, Type::Bytes)],
        ..Default::default()
    };
    pool_with_messages(vec![message])
        .get_message_by_name("test.BytesOnly")
        .expect("test.BytesOnly registered")
}

pub fn bytes_only_annotation(c: &[u8]) -> Vec<u8> {
    let mut msg = DynamicMessage::new(bytes_only_descriptor());
    msg.set_field_by_number(3, Value::Bytes(bytes::Bytes::copy_from_slice(c)));
    msg.encode_to_vec()
}

/// `test.NestedOnly`: a single nested-message field, no custom fields.
pub fn nested_only_descriptor() -> MessageDescriptor {
    let message = DescriptorProto {
        name: Some("NestedOnly".to_string()),
        field: vec![message_field("e", 2, ".test.Nested")],
        ..Default::default()
    };
    pool_with_messages(vec![nested_proto(), message])
        .get_message_by_name("test.NestedOnly")
        .expect("test.NestedOnly registered")
}

pub fn nested_only_annotation(inner: i64) -> Vec<u8> {
    let desc = nested_only_descriptor();
    let nested_desc = desc
        .parent_pool()
        .get_message_by_name("test.Nested")
        .expect("test.Nested registered");
    let mut msg = DynamicMessage::new(desc);
    let mut nested = DynamicMessage::new(nested_desc);
    nested.set_field_by_number(1, Value::I64(inner));
    msg.set_field_by_number(2, Value::Message(nested));
    msg.encode_to_vec()
}

/// Wire bytes carrying a field number the `test.Sample` schema doesn't know.
pub fn unknown_field_annotation() -> Vec<u8> {
    let wide = DescriptorProto {
        name: Some("SampleWide".to_string()),
        field: vec![
            field("a", 1, Type::Double),
            field("extra", 6, Type::Int64),
        ],
        ..Default::default()
    };
    let desc = pool_with_messages(vec![wide])
        .get_message_by_name("test.SampleWide")
        .expect("test.SampleWide registered");
    let mut msg = DynamicMessage::new(desc);
    msg.set_field_by_number(1, Value::F64(1.0));
    msg.set_field_by_number(6, Value::I64(42));
    msg.encode_to_vec()
}

pub const SECS: i64 = 1_000_000_000;

pub fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn skip_bits(reader: &mut bitstream::BitReader<'_>, bits: usize) {
    for _ in 0..bits {
        reader.read_bit().expect("skipped bit within stream");
    }
}
