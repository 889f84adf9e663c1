use greeter_service::{
    ALPHA_SERVICE, BETA_SERVICE, COMMON_FILE, DESCRIPTOR_FILE, GREETER_FILE, GREETER_SERVICE,
    HEALTH_SERVICE, METHOD_OPTIONS, alpha_pool, beta_pool, diamond_pool, greeter_pool,
    mirror_pool,
};
use prost_types::FileDescriptorProto;
use reflector_core::prost::Message;
use reflector_core::{
    BuildError, Builder, IndexBuildError, ReflectionService, ServiceRegistration,
};
use tonic_reflection::pb::v1::{
    ExtensionRequest, ServerReflectionRequest, ServerReflectionResponse,
    server_reflection_client::ServerReflectionClient, server_reflection_request::MessageRequest,
    server_reflection_response::MessageResponse,
};

const HOST: &str = "localhost:50051";

fn greeter_service() -> ReflectionService {
    Builder::configure()
        .register_service(ServiceRegistration::from_pool(
            &greeter_pool(),
            GREETER_SERVICE,
        ))
        .include_reflection_service(false)
        .build()
        .expect("Failed to build the reflection service")
}

fn request(message_request: Option<MessageRequest>) -> ServerReflectionRequest {
    ServerReflectionRequest {
        host: HOST.to_string(),
        message_request,
    }
}

async fn exchange(
    service: ReflectionService,
    requests: Vec<ServerReflectionRequest>,
) -> Vec<ServerReflectionResponse> {
    let mut client = ServerReflectionClient::new(service.into_v1_server());

    let mut stream = client
        .server_reflection_info(tokio_stream::iter(requests))
        .await
        .expect("Failed to open the reflection stream")
        .into_inner();

    let mut responses = Vec::new();

    while let Some(response) = stream
        .message()
        .await
        .expect("The reflection stream failed")
    {
        responses.push(response);
    }

    responses
}

async fn single(message_request: Option<MessageRequest>) -> MessageResponse {
    let mut responses = exchange(greeter_service(), vec![request(message_request)]).await;

    assert_eq!(responses.len(), 1);

    responses
        .remove(0)
        .message_response
        .expect("Every response carries a payload")
}

fn file_names(response: MessageResponse) -> Vec<String> {
    match response {
        MessageResponse::FileDescriptorResponse(res) => res
            .file_descriptor_proto
            .iter()
            .map(|raw| {
                FileDescriptorProto::decode(&raw[..])
                    .expect("Failed to decode FileDescriptorProto")
                    .name
                    .unwrap_or_default()
            })
            .collect(),
        other => panic!("Expected a file descriptor response, got {other:?}"),
    }
}

fn error(response: MessageResponse) -> (i32, String) {
    match response {
        MessageResponse::ErrorResponse(e) => (e.error_code, e.error_message),
        other => panic!("Expected an error response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_services() {
    let response = single(Some(MessageRequest::ListServices(String::new()))).await;

    match response {
        MessageResponse::ListServicesResponse(res) => {
            assert_eq!(res.service.len(), 1);
            assert_eq!(res.service[0].name, GREETER_SERVICE);
        }
        other => panic!("Expected a list services response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_descriptor_queries_return_the_closure() {
    let requests = [
        MessageRequest::FileContainingSymbol("grpc.greeter.v1.Greeter.SayHello".to_string()),
        MessageRequest::FileByFilename(GREETER_FILE.to_string()),
        MessageRequest::FileContainingExtension(ExtensionRequest {
            containing_type: METHOD_OPTIONS.to_string(),
            extension_number: 50000,
        }),
    ];

    for message_request in requests {
        let response = single(Some(message_request)).await;
        assert_eq!(file_names(response), [GREETER_FILE, DESCRIPTOR_FILE]);
    }
}

#[tokio::test]
async fn test_closure_bytes_are_the_canonical_encoding() {
    let pool = greeter_pool();
    let expected: Vec<Vec<u8>> = [GREETER_FILE, DESCRIPTOR_FILE]
        .iter()
        .map(|name| pool.get_file_by_name(name).unwrap().encode_to_vec())
        .collect();

    let response = single(Some(MessageRequest::FileByFilename(
        GREETER_FILE.to_string(),
    )))
    .await;

    match response {
        MessageResponse::FileDescriptorResponse(res) => {
            let actual: Vec<Vec<u8>> = res
                .file_descriptor_proto
                .iter()
                .map(|raw| raw.to_vec())
                .collect();
            assert_eq!(actual, expected);
        }
        other => panic!("Expected a file descriptor response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_errors() {
    let cases = [
        (
            MessageRequest::FileContainingSymbol("grpc.greeter.v1.Greeter.NonExistent".to_string()),
            "Symbol not found (grpc.greeter.v1.Greeter.NonExistent)",
        ),
        (
            MessageRequest::FileByFilename("grpc/greeter/v1/nonexistent.proto".to_string()),
            "File not found (grpc/greeter/v1/nonexistent.proto)",
        ),
        (
            MessageRequest::FileContainingExtension(ExtensionRequest {
                containing_type: METHOD_OPTIONS.to_string(),
                extension_number: 60000,
            }),
            "Extension not found (google.protobuf.MethodOptions, 60000)",
        ),
        (
            MessageRequest::AllExtensionNumbersOfType("com.example.nonexistent".to_string()),
            "Type not found.",
        ),
    ];

    for (message_request, message) in cases {
        let response = single(Some(message_request)).await;
        assert_eq!(error(response), (5, message.to_string()));
    }
}

#[tokio::test]
async fn test_all_extension_numbers_of_type() {
    let response = single(Some(MessageRequest::AllExtensionNumbersOfType(
        METHOD_OPTIONS.to_string(),
    )))
    .await;

    match response {
        MessageResponse::AllExtensionNumbersResponse(res) => {
            assert_eq!(res.base_type_name, METHOD_OPTIONS);
            assert_eq!(res.extension_number, [50000]);
        }
        other => panic!("Expected an extension numbers response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_message_request_not_set() {
    let response = single(None).await;

    assert_eq!(
        error(response),
        (12, "not implemented MESSAGEREQUEST_NOT_SET".to_string())
    );
}

#[tokio::test]
async fn test_responses_keep_request_order_and_echo_requests() {
    let requests = vec![
        request(Some(MessageRequest::FileContainingSymbol(
            "grpc.greeter.v1.Ghost".to_string(),
        ))),
        request(Some(MessageRequest::ListServices(String::new()))),
        request(None),
        request(Some(MessageRequest::FileByFilename(GREETER_FILE.to_string()))),
    ];

    let responses = exchange(greeter_service(), requests.clone()).await;

    // An error response does not end the stream.
    assert_eq!(responses.len(), requests.len());

    for (response, request) in responses.iter().zip(&requests) {
        assert_eq!(response.valid_host, HOST);
        assert_eq!(response.original_request.as_ref(), Some(request));
    }

    assert!(matches!(
        responses[0].message_response,
        Some(MessageResponse::ErrorResponse(_))
    ));
    assert!(matches!(
        responses[1].message_response,
        Some(MessageResponse::ListServicesResponse(_))
    ));
    assert!(matches!(
        responses[2].message_response,
        Some(MessageResponse::ErrorResponse(_))
    ));
    assert!(matches!(
        responses[3].message_response,
        Some(MessageResponse::FileDescriptorResponse(_))
    ));
}

#[tokio::test]
async fn test_diamond_dependencies_are_sent_once() {
    let service = Builder::configure()
        .register_pool(&diamond_pool())
        .include_reflection_service(false)
        .build()
        .unwrap();

    let mut responses = exchange(
        service,
        vec![request(Some(MessageRequest::FileContainingSymbol(
            "diamond.a.Top".to_string(),
        )))],
    )
    .await;

    let response = responses.remove(0).message_response.unwrap();

    assert_eq!(
        file_names(response),
        [
            "diamond/a.proto",
            "diamond/b.proto",
            "diamond/c.proto",
            "diamond/d.proto"
        ]
    );
}

#[tokio::test]
async fn test_concurrent_streams_share_the_index() {
    let service = greeter_service();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                exchange(
                    service,
                    vec![request(Some(MessageRequest::FileContainingSymbol(
                        "grpc.greeter.v1.HelloRequest".to_string(),
                    )))],
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        let mut responses = handle.await.expect("stream task panicked");
        let response = responses.remove(0).message_response.unwrap();
        assert_eq!(file_names(response), [GREETER_FILE, DESCRIPTOR_FILE]);
    }
}

#[tokio::test]
async fn test_builder_lists_the_reflection_service() {
    let encoded = greeter_pool().encode_to_vec();

    let service = Builder::configure()
        .register_encoded_file_descriptor_set(&encoded)
        .build()
        .unwrap();

    let names: Vec<&str> = service.index().service_names().collect();

    assert_eq!(
        names,
        [
            GREETER_SERVICE,
            "grpc.reflection.v1.ServerReflection",
            "grpc.reflection.v1alpha.ServerReflection",
        ]
    );
}

#[tokio::test]
async fn test_builder_rejects_services_declared_in_two_files() {
    let greeter = greeter_pool().encode_to_vec();
    let mirror = mirror_pool().encode_to_vec();

    let result = Builder::configure()
        .register_encoded_file_descriptor_set(&greeter)
        .register_encoded_file_descriptor_set(&mirror)
        .build();

    assert!(matches!(
        result,
        Err(BuildError::Index(IndexBuildError::DuplicateService(name))) if name == GREETER_SERVICE
    ));
}

#[tokio::test]
async fn test_builder_accepts_descriptor_sets_sharing_a_file() {
    let alpha = alpha_pool().encode_to_vec();
    let beta = beta_pool().encode_to_vec();

    let service = Builder::configure()
        .register_encoded_file_descriptor_set(&alpha)
        .register_encoded_file_descriptor_set(&beta)
        .include_reflection_service(false)
        .build()
        .unwrap();

    let index = service.index();

    assert_eq!(
        index.service_names().collect::<Vec<_>>(),
        [HEALTH_SERVICE, ALPHA_SERVICE, BETA_SERVICE]
    );
    assert_eq!(
        index.file_by_symbol(HEALTH_SERVICE).map(|f| f.name()),
        Some(COMMON_FILE)
    );
}

#[tokio::test]
async fn test_builder_accepts_the_same_descriptor_set_twice() {
    let encoded = greeter_pool().encode_to_vec();

    let service = Builder::configure()
        .register_encoded_file_descriptor_set(&encoded)
        .register_encoded_file_descriptor_set(&encoded)
        .include_reflection_service(false)
        .build()
        .unwrap();

    assert_eq!(
        service.index().service_names().collect::<Vec<_>>(),
        [GREETER_SERVICE]
    );
}

#[tokio::test]
async fn test_builder_does_not_list_the_reflection_service_twice() {
    let service = Builder::configure()
        .register_encoded_file_descriptor_set(tonic_reflection::pb::v1::FILE_DESCRIPTOR_SET)
        .build()
        .unwrap();

    assert_eq!(
        service.index().service_names().collect::<Vec<_>>(),
        [
            "grpc.reflection.v1.ServerReflection",
            "grpc.reflection.v1alpha.ServerReflection",
        ]
    );
}

#[tokio::test]
async fn test_builder_rejects_invalid_descriptor_sets() {
    let result = Builder::configure()
        .register_encoded_file_descriptor_set(b"definitely not protobuf")
        .build();

    assert!(matches!(result, Err(BuildError::Descriptor(_))));
}

#[tokio::test]
async fn test_v1alpha_is_served_from_the_same_index() {
    use tonic_reflection::pb::v1alpha;

    let mut client = v1alpha::server_reflection_client::ServerReflectionClient::new(
        greeter_service().into_v1alpha_server(),
    );

    let request = v1alpha::ServerReflectionRequest {
        host: HOST.to_string(),
        message_request: Some(
            v1alpha::server_reflection_request::MessageRequest::FileContainingSymbol(
                "grpc.greeter.v1.Greeter.NonExistent".to_string(),
            ),
        ),
    };

    let mut stream = client
        .server_reflection_info(tokio_stream::iter(vec![request.clone()]))
        .await
        .unwrap()
        .into_inner();

    let response = stream.message().await.unwrap().expect("one response");

    assert_eq!(response.valid_host, HOST);
    assert_eq!(response.original_request, Some(request));
    match response.message_response {
        Some(v1alpha::server_reflection_response::MessageResponse::ErrorResponse(e)) => {
            assert_eq!(e.error_code, 5);
            assert_eq!(
                e.error_message,
                "Symbol not found (grpc.greeter.v1.Greeter.NonExistent)"
            );
        }
        other => panic!("Expected an error response, got {other:?}"),
    }

    assert!(stream.message().await.unwrap().is_none());
}
