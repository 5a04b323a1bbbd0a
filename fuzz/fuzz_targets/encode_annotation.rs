#![no_main]

use libfuzzer_sys::fuzz_target;
use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use codec::{Datapoint, Encoder, Options, TimeUnit};
use schema::SchemaDescriptor;

fn field(name: &str, number: i32, typ: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(typ as i32),
        ..Default::default()
    }
}

fn fuzz_descriptor() -> MessageDescriptor {
    let message = DescriptorProto {
        name: Some("Fuzz".to_string()),
        field: vec![
            field("a", 1, Type::Double),
            field("b", 2, Type::Sint64),
            field("c", 3, Type::Bytes),
            field("d", 4, Type::Bool),
            field("e", 5, Type::Uint32),
        ],
        ..Default::default()
    };
    let file = FileDescriptorProto {
        name: Some("fuzz.proto".to_string()),
        package: Some("fuzz".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![message],
        ..Default::default()
    };
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
        .expect("valid fuzz descriptor")
        .get_message_by_name("fuzz.Fuzz")
        .expect("fuzz.Fuzz registered")
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either unmarshal into the schema or surface a soft
    // error; neither path may panic or poison the encoder.
    let mut encoder = Encoder::new(0, Options::new());
    encoder.set_schema(Some(SchemaDescriptor::new(fuzz_descriptor(), "fuzz-1")));

    const SECS: i64 = 1_000_000_000;
    let _ = encoder.encode(Datapoint::at(SECS), TimeUnit::Seconds, data);
    let _ = encoder.encode(Datapoint::at(2 * SECS), TimeUnit::Seconds, data);

    if encoder.num_encoded() > 0 {
        let segment = encoder.discard();
        assert!(!segment.is_empty());
    }
});
