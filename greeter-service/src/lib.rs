//! # Greeter Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide Protobuf schemas for
//! testing the `reflector` workspace. It is not intended for production use.
//!
//! The schemas are assembled programmatically as `FileDescriptorProto`s so that tests
//! can shape the dependency graph (diamonds, colliding symbols, duplicated extensions)
//! without a `protoc` step.
use prost_reflect::DescriptorPool;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
    descriptor_proto::ExtensionRange,
    field_descriptor_proto::{Label, Type},
};

pub const GREETER_FILE: &str = "grpc/greeter/v1/greeter.proto";
pub const GREETER_SERVICE: &str = "grpc.greeter.v1.Greeter";
pub const SAY_HELLO_METHOD: &str = "grpc.greeter.v1.Greeter.SayHello";
pub const DESCRIPTOR_FILE: &str = "google/protobuf/descriptor.proto";
pub const METHOD_OPTIONS: &str = "google.protobuf.MethodOptions";
pub const HTTP_ROUTE_EXTENSION: u32 = 50000;

pub const DIAMOND_SERVICE: &str = "diamond.a.Top";
pub const DIAMOND_FILES: [&str; 4] = [
    "diamond/a.proto",
    "diamond/b.proto",
    "diamond/c.proto",
    "diamond/d.proto",
];

pub const MIRROR_SERVICE: &str = "grpc.greeter.v1.Mirror";
pub const SHADOW_SERVICE: &str = "grpc.greeter.v1.Greeter.Shadow";
pub const CLASHING_TYPE_SERVICE: &str = "grpc.greeter.v1.Impostor";
pub const CLASHING_EXTENSION_SERVICE: &str = "conflict.Routes";
pub const UNRELATED_SERVICE: &str = "unrelated.v1.Unrelated";

pub const OPTS_MESSAGE: &str = "nested.Opts";
pub const HOLDER_FILE: &str = "nested/holder.proto";
pub const NESTED_EXTENSION: u32 = 150;
pub const KEEPER_SERVICE: &str = "nested.Keeper";
pub const RIVAL_SERVICE: &str = "nested.Rival";

pub const COMMON_FILE: &str = "common.proto";
pub const HEALTH_SERVICE: &str = "common.Health";
pub const ALPHA_SERVICE: &str = "overlap.alpha.Alpha";
pub const BETA_SERVICE: &str = "overlap.beta.Beta";

/// The greeter schema: `grpc/greeter/v1/greeter.proto` importing a trimmed down
/// `google/protobuf/descriptor.proto` and extending `MethodOptions` with field `50000`.
pub fn greeter_pool() -> DescriptorPool {
    let greeter = FileDescriptorProto {
        name: Some(GREETER_FILE.to_string()),
        package: Some("grpc.greeter.v1".to_string()),
        dependency: vec![DESCRIPTOR_FILE.to_string()],
        message_type: vec![
            message("HelloRequest", vec![string_field("name", 1)]),
            DescriptorProto {
                nested_type: vec![message("Metadata", vec![string_field("locale", 1)])],
                ..message("HelloReply", vec![string_field("message", 1)])
            },
        ],
        service: vec![service(
            "Greeter",
            vec![method(
                "SayHello",
                ".grpc.greeter.v1.HelloRequest",
                ".grpc.greeter.v1.HelloReply",
            )],
        )],
        extension: vec![extension(
            "http_route",
            HTTP_ROUTE_EXTENSION as i32,
            ".google.protobuf.MethodOptions",
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![descriptor_file(), greeter])
}

/// `diamond/a.proto` depends on `b` and `c`, both of which depend on `d`.
pub fn diamond_pool() -> DescriptorPool {
    let d = FileDescriptorProto {
        name: Some("diamond/d.proto".to_string()),
        package: Some("diamond.d".to_string()),
        message_type: vec![message("D", vec![string_field("value", 1)])],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    let b = FileDescriptorProto {
        name: Some("diamond/b.proto".to_string()),
        package: Some("diamond.b".to_string()),
        dependency: vec!["diamond/d.proto".to_string()],
        message_type: vec![message("B", vec![message_field("d", 1, ".diamond.d.D")])],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    let c = FileDescriptorProto {
        name: Some("diamond/c.proto".to_string()),
        package: Some("diamond.c".to_string()),
        dependency: vec!["diamond/d.proto".to_string()],
        message_type: vec![message("C", vec![message_field("d", 1, ".diamond.d.D")])],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    let a = FileDescriptorProto {
        name: Some("diamond/a.proto".to_string()),
        package: Some("diamond.a".to_string()),
        dependency: vec!["diamond/b.proto".to_string(), "diamond/c.proto".to_string()],
        message_type: vec![message(
            "Request",
            vec![
                message_field("b", 1, ".diamond.b.B"),
                message_field("c", 2, ".diamond.c.C"),
            ],
        )],
        service: vec![service(
            "Top",
            vec![method("Call", ".diamond.a.Request", ".diamond.a.Request")],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![d, b, c, a])
}

/// A file declaring `grpc.greeter.v1.Mirror` followed by a second copy of
/// `grpc.greeter.v1.Greeter`.
pub fn mirror_pool() -> DescriptorPool {
    let mirror = FileDescriptorProto {
        name: Some("conflict/mirror.proto".to_string()),
        package: Some("grpc.greeter.v1".to_string()),
        message_type: vec![message("MirrorRequest", vec![string_field("name", 1)])],
        service: vec![
            service(
                "Mirror",
                vec![method(
                    "Reflect",
                    ".grpc.greeter.v1.MirrorRequest",
                    ".grpc.greeter.v1.MirrorRequest",
                )],
            ),
            service(
                "Greeter",
                vec![method(
                    "SayHello",
                    ".grpc.greeter.v1.MirrorRequest",
                    ".grpc.greeter.v1.MirrorRequest",
                )],
            ),
        ],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![mirror])
}

/// A file whose package is `grpc.greeter.v1.Greeter`, so its `SayHello` message shares
/// its full name with the greeter's `SayHello` method.
pub fn shadow_pool() -> DescriptorPool {
    let shadow = FileDescriptorProto {
        name: Some("conflict/shadow.proto".to_string()),
        package: Some("grpc.greeter.v1.Greeter".to_string()),
        message_type: vec![message("SayHello", vec![string_field("name", 1)])],
        service: vec![service(
            "Shadow",
            vec![method(
                "Echo",
                ".grpc.greeter.v1.Greeter.SayHello",
                ".grpc.greeter.v1.Greeter.SayHello",
            )],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![shadow])
}

/// A file that declares its own `grpc.greeter.v1.HelloRequest`.
pub fn clashing_type_pool() -> DescriptorPool {
    let impostor = FileDescriptorProto {
        name: Some("conflict/impostor.proto".to_string()),
        package: Some("grpc.greeter.v1".to_string()),
        message_type: vec![message("HelloRequest", vec![string_field("name", 1)])],
        service: vec![service(
            "Impostor",
            vec![method(
                "Pretend",
                ".grpc.greeter.v1.HelloRequest",
                ".grpc.greeter.v1.HelloRequest",
            )],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![impostor])
}

/// A file that extends `google.protobuf.MethodOptions` with the same field number
/// as the greeter schema.
pub fn clashing_extension_pool() -> DescriptorPool {
    let routes = FileDescriptorProto {
        name: Some("conflict/routes.proto".to_string()),
        package: Some("conflict".to_string()),
        dependency: vec![DESCRIPTOR_FILE.to_string()],
        message_type: vec![message("Route", vec![string_field("path", 1)])],
        service: vec![service(
            "Routes",
            vec![method("Resolve", ".conflict.Route", ".conflict.Route")],
        )],
        extension: vec![extension(
            "route",
            HTTP_ROUTE_EXTENSION as i32,
            ".google.protobuf.MethodOptions",
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    };

    pool(vec![descriptor_file(), routes])
}

/// A standalone schema without any relationship to the greeter.
pub fn unrelated_pool() -> DescriptorPool {
    let unrelated = FileDescriptorProto {
        name: Some("unrelated/v1/unrelated.proto".to_string()),
        package: Some("unrelated.v1".to_string()),
        message_type: vec![DescriptorProto {
            nested_type: vec![DescriptorProto {
                nested_type: vec![message("Inner", vec![string_field("value", 1)])],
                ..message("Middle", vec![])
            }],
            extension_range: vec![ExtensionRange {
                start: Some(100),
                end: Some(200),
                options: None,
            }],
            ..message("Outer", vec![])
        }],
        service: vec![service(
            "Unrelated",
            vec![method(
                "Ping",
                ".unrelated.v1.Outer",
                ".unrelated.v1.Outer.Middle.Inner",
            )],
        )],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    };

    pool(vec![unrelated])
}

/// `nested/holder.proto` declares extension `150` of `nested.Opts` inside message
/// `Holder` rather than at file level.
pub fn nested_extension_pool() -> DescriptorPool {
    let holder = FileDescriptorProto {
        name: Some(HOLDER_FILE.to_string()),
        package: Some("nested".to_string()),
        dependency: vec![NESTED_BASE_FILE.to_string()],
        message_type: vec![DescriptorProto {
            extension: vec![extension("ext", NESTED_EXTENSION as i32, ".nested.Opts")],
            ..message("Holder", vec![string_field("value", 1)])
        }],
        service: vec![service(
            "Keeper",
            vec![method("Keep", ".nested.Holder", ".nested.Holder")],
        )],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    };

    pool(vec![nested_base_file(), holder])
}

/// A file that extends `nested.Opts` with `150` at file level.
pub fn rival_extension_pool() -> DescriptorPool {
    let rival = FileDescriptorProto {
        name: Some("nested/rival.proto".to_string()),
        package: Some("nested".to_string()),
        dependency: vec![NESTED_BASE_FILE.to_string()],
        message_type: vec![message("RivalRequest", vec![string_field("value", 1)])],
        service: vec![service(
            "Rival",
            vec![method("Claim", ".nested.RivalRequest", ".nested.RivalRequest")],
        )],
        extension: vec![extension(
            "rival_ext",
            NESTED_EXTENSION as i32,
            ".nested.Opts",
        )],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    };

    pool(vec![nested_base_file(), rival])
}

/// `overlap/alpha.proto` importing `common.proto`, which declares `common.Health`.
pub fn alpha_pool() -> DescriptorPool {
    pool(vec![common_file(), overlap_file("alpha", "Alpha")])
}

/// `overlap/beta.proto` importing the same `common.proto` as [`alpha_pool`].
pub fn beta_pool() -> DescriptorPool {
    pool(vec![common_file(), overlap_file("beta", "Beta")])
}

const NESTED_BASE_FILE: &str = "nested/base.proto";

fn nested_base_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(NESTED_BASE_FILE.to_string()),
        package: Some("nested".to_string()),
        message_type: vec![DescriptorProto {
            extension_range: vec![ExtensionRange {
                start: Some(100),
                end: Some(200),
                options: None,
            }],
            ..message("Opts", vec![])
        }],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

fn common_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(COMMON_FILE.to_string()),
        package: Some("common".to_string()),
        message_type: vec![message("Ping", vec![string_field("payload", 1)])],
        service: vec![service(
            "Health",
            vec![method("Check", ".common.Ping", ".common.Ping")],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn overlap_file(package: &str, service_name: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(format!("overlap/{package}.proto")),
        package: Some(format!("overlap.{package}")),
        dependency: vec![COMMON_FILE.to_string()],
        service: vec![service(
            service_name,
            vec![method("Call", ".common.Ping", ".common.Ping")],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn pool(files: Vec<FileDescriptorProto>) -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: files })
        .expect("fixture schema must be valid")
}

fn descriptor_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(DESCRIPTOR_FILE.to_string()),
        package: Some("google.protobuf".to_string()),
        message_type: vec![DescriptorProto {
            extension_range: vec![ExtensionRange {
                start: Some(1000),
                end: Some(536_870_912),
                options: None,
            }],
            ..message("MethodOptions", vec![])
        }],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        ..Default::default()
    }
}

fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

fn extension(name: &str, number: i32, extendee: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        extendee: Some(extendee.to_string()),
        ..string_field(name, number)
    }
}

fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

fn service(name: &str, method: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method,
        ..Default::default()
    }
}
