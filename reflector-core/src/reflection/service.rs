//! # Reflection Service
//!
//! The tonic binding of the reflection protocol, for both `grpc.reflection.v1` and
//! `grpc.reflection.v1alpha`.
//!
//! Every inbound message of a `ServerReflectionInfo` stream is answered with exactly
//! one outbound message, in order. Responses echo the original request and the host
//! it addressed so clients can correlate them on a multiplexed stream. Failed lookups
//! are regular `ErrorResponse` messages; the stream only ends when the client closes
//! it or the transport fails.
//!
//! ## Example
//!
//! ```rust,ignore
//! let reflection = Builder::configure()
//!     .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
//!     .build_v1()?;
//!
//! tonic::transport::Server::builder()
//!     .add_service(reflection)
//!     .serve(addr)
//!     .await?;
//! ```
use super::query::{QueryError, ReflectionQuery, ReflectionReply};
use crate::{
    index::{IndexBuildError, ReflectionIndex},
    registration::ServiceRegistration,
};
use prost_reflect::{DescriptorError, DescriptorPool};
use std::{pin::Pin, sync::Arc};
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tonic_reflection::pb::{v1, v1alpha};

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to build the reflection index: {0}")]
    Index(#[from] IndexBuildError),

    #[error("Failed to decode file descriptor set: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// A reflection service answering queries from a shared, immutable [`ReflectionIndex`].
///
/// Cloning is cheap; every clone reads the same index.
#[derive(Debug, Clone)]
pub struct ReflectionService {
    index: Arc<ReflectionIndex>,
}

impl ReflectionService {
    pub fn new(index: ReflectionIndex) -> Self {
        Self::from_shared(Arc::new(index))
    }

    pub fn from_shared(index: Arc<ReflectionIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &ReflectionIndex {
        &self.index
    }

    pub fn into_v1_server(self) -> v1::server_reflection_server::ServerReflectionServer<Self> {
        v1::server_reflection_server::ServerReflectionServer::new(self)
    }

    pub fn into_v1alpha_server(
        self,
    ) -> v1alpha::server_reflection_server::ServerReflectionServer<Self> {
        v1alpha::server_reflection_server::ServerReflectionServer::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolVersion {
    V1,
    V1Alpha,
}

/// Configures a [`ReflectionService`], in the manner of `tonic_reflection::server::Builder`.
#[derive(Debug)]
pub struct Builder<'b> {
    registrations: Vec<ServiceRegistration>,
    encoded_file_descriptor_sets: Vec<&'b [u8]>,
    include_reflection_service: bool,
}

impl<'b> Builder<'b> {
    /// A builder without services that lists the reflection service itself.
    pub fn configure() -> Self {
        Self {
            registrations: Vec::new(),
            encoded_file_descriptor_sets: Vec::new(),
            include_reflection_service: true,
        }
    }

    /// Registers a single hosted service.
    pub fn register_service(mut self, registration: ServiceRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Registers every service declared in `pool`.
    pub fn register_pool(mut self, pool: &DescriptorPool) -> Self {
        self.registrations
            .extend(ServiceRegistration::all_from_pool(pool));
        self
    }

    /// Registers every service of an encoded `FileDescriptorSet`.
    ///
    /// The set is decoded when the service is built.
    pub fn register_encoded_file_descriptor_set(mut self, encoded: &'b [u8]) -> Self {
        self.encoded_file_descriptor_sets.push(encoded);
        self
    }

    /// Whether the reflection service lists (and describes) itself. Defaults to `true`.
    pub fn include_reflection_service(mut self, include: bool) -> Self {
        self.include_reflection_service = include;
        self
    }

    /// Builds a service that can be served as both protocol versions.
    pub fn build(self) -> Result<ReflectionService, BuildError> {
        self.build_for(&[ProtocolVersion::V1, ProtocolVersion::V1Alpha])
    }

    pub fn build_v1(
        self,
    ) -> Result<v1::server_reflection_server::ServerReflectionServer<ReflectionService>, BuildError>
    {
        Ok(self.build_for(&[ProtocolVersion::V1])?.into_v1_server())
    }

    pub fn build_v1alpha(
        self,
    ) -> Result<
        v1alpha::server_reflection_server::ServerReflectionServer<ReflectionService>,
        BuildError,
    > {
        Ok(self.build_for(&[ProtocolVersion::V1Alpha])?.into_v1alpha_server())
    }

    fn build_for(self, versions: &[ProtocolVersion]) -> Result<ReflectionService, BuildError> {
        let mut registrations = Vec::new();

        for registration in self.registrations {
            push_registration(&mut registrations, registration);
        }

        for encoded in self.encoded_file_descriptor_sets {
            let pool = DescriptorPool::decode(encoded)?;

            for registration in ServiceRegistration::all_from_pool(&pool) {
                push_registration(&mut registrations, registration);
            }
        }

        if self.include_reflection_service {
            for version in versions {
                let registration = reflection_registration(*version)?;

                if registrations
                    .iter()
                    .any(|existing| existing.name() == registration.name())
                {
                    tracing::debug!(
                        service = registration.name(),
                        "Reflection service already registered"
                    );
                    continue;
                }

                registrations.push(registration);
            }
        }

        let index = ReflectionIndex::build(registrations)?;

        Ok(ReflectionService::new(index))
    }
}

/// Appends `registration` unless the same service, declared in the same file, is
/// already present. Descriptor sets built with `--include_imports` routinely repeat
/// shared files.
fn push_registration(
    registrations: &mut Vec<ServiceRegistration>,
    registration: ServiceRegistration,
) {
    let declaring_file = |registration: &ServiceRegistration| {
        registration.file().map(|file| file.name().to_string())
    };

    let repeated = registrations.iter().any(|existing| {
        existing.name() == registration.name()
            && declaring_file(existing) == declaring_file(&registration)
    });

    if repeated {
        tracing::debug!(service = registration.name(), "Skipping repeated service");
    } else {
        registrations.push(registration);
    }
}

fn reflection_registration(version: ProtocolVersion) -> Result<ServiceRegistration, BuildError> {
    let registration = match version {
        ProtocolVersion::V1 => {
            let pool = DescriptorPool::decode(v1::FILE_DESCRIPTOR_SET)?;
            ServiceRegistration::named::<
                v1::server_reflection_server::ServerReflectionServer<ReflectionService>,
            >(&pool)
        }
        ProtocolVersion::V1Alpha => {
            let pool = DescriptorPool::decode(v1alpha::FILE_DESCRIPTOR_SET)?;
            ServiceRegistration::named::<
                v1alpha::server_reflection_server::ServerReflectionServer<ReflectionService>,
            >(&pool)
        }
    };

    Ok(registration)
}

/// Generates the wire conversions and the tonic trait implementation for one protocol
/// version; both versions share the exact same message shapes.
macro_rules! reflection_protocol {
    ($module:ident, $version:ident) => {
        mod $module {
            use super::*;
            use tonic_reflection::pb::$version::{
                ErrorResponse, ExtensionNumberResponse, FileDescriptorResponse,
                ListServiceResponse, ServerReflectionRequest, ServerReflectionResponse,
                ServiceResponse, server_reflection_request::MessageRequest,
                server_reflection_response::MessageResponse,
                server_reflection_server::ServerReflection,
            };

            #[tonic::async_trait]
            impl ServerReflection for ReflectionService {
                type ServerReflectionInfoStream = ResponseStream<ServerReflectionResponse>;

                async fn server_reflection_info(
                    &self,
                    request: Request<Streaming<ServerReflectionRequest>>,
                ) -> Result<Response<Self::ServerReflectionInfoStream>, Status> {
                    let responses = responses(Arc::clone(&self.index), request.into_inner());

                    Ok(Response::new(Box::pin(responses)))
                }
            }

            /// One response per inbound message. An inbound error is passed through
            /// as the terminal status.
            pub(super) fn responses<S>(
                index: Arc<ReflectionIndex>,
                requests: S,
            ) -> impl Stream<Item = Result<ServerReflectionResponse, Status>> + Send + 'static
            where
                S: Stream<Item = Result<ServerReflectionRequest, Status>> + Send + 'static,
            {
                requests.map(move |message| message.map(|request| respond(&index, request)))
            }

            fn respond(
                index: &ReflectionIndex,
                request: ServerReflectionRequest,
            ) -> ServerReflectionResponse {
                let query = query(&request);

                tracing::debug!(
                    protocol = stringify!($version),
                    kind = query.kind(),
                    host = %request.host,
                    "Reflection request received"
                );

                let message_response = match index.resolve(&query) {
                    Ok(reply) => reply_message(reply),
                    Err(error) => error_message(error),
                };

                ServerReflectionResponse {
                    valid_host: request.host.clone(),
                    original_request: Some(request),
                    message_response: Some(message_response),
                }
            }

            fn query(request: &ServerReflectionRequest) -> ReflectionQuery {
                match &request.message_request {
                    Some(MessageRequest::ListServices(_)) => ReflectionQuery::ListServices,
                    Some(MessageRequest::FileByFilename(name)) => {
                        ReflectionQuery::FileByFilename(name.clone())
                    }
                    Some(MessageRequest::FileContainingSymbol(symbol)) => {
                        ReflectionQuery::FileContainingSymbol(symbol.clone())
                    }
                    Some(MessageRequest::FileContainingExtension(extension)) => {
                        ReflectionQuery::FileContainingExtension {
                            containing_type: extension.containing_type.clone(),
                            extension_number: extension.extension_number,
                        }
                    }
                    Some(MessageRequest::AllExtensionNumbersOfType(containing_type)) => {
                        ReflectionQuery::AllExtensionNumbersOfType(containing_type.clone())
                    }
                    None => ReflectionQuery::Unset,
                }
            }

            fn reply_message(reply: ReflectionReply) -> MessageResponse {
                match reply {
                    ReflectionReply::Services(names) => {
                        MessageResponse::ListServicesResponse(ListServiceResponse {
                            service: names
                                .into_iter()
                                .map(|name| ServiceResponse { name })
                                .collect(),
                        })
                    }
                    ReflectionReply::FileDescriptors(files) => {
                        MessageResponse::FileDescriptorResponse(FileDescriptorResponse {
                            file_descriptor_proto: files.into_iter().map(Into::into).collect(),
                        })
                    }
                    ReflectionReply::ExtensionNumbers {
                        base_type_name,
                        extension_numbers,
                    } => MessageResponse::AllExtensionNumbersResponse(ExtensionNumberResponse {
                        base_type_name,
                        extension_number: extension_numbers,
                    }),
                }
            }

            fn error_message(error: QueryError) -> MessageResponse {
                tracing::debug!(
                    protocol = stringify!($version),
                    code = ?error.code(),
                    message = %error,
                    "Reflection query failed"
                );

                MessageResponse::ErrorResponse(ErrorResponse {
                    error_code: error.code() as i32,
                    error_message: error.to_string(),
                })
            }
        }
    };
}

reflection_protocol!(v1_protocol, v1);
reflection_protocol!(v1alpha_protocol, v1alpha);
