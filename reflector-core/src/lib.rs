//! # Reflector Core
//!
//! `reflector-core` is the foundational library powering the Reflector server. It exposes
//! the API surface of a tonic gRPC server through the gRPC Server Reflection Protocol,
//! answering queries from an in-memory index built over the server's Protobuf schema.
//!
//! ## Key Components
//!
//! * **[`ServiceRegistration`]:** What the server hands over: one record per hosted
//!   service, optionally backed by the file descriptor declaring it.
//! * **[`ReflectionIndex`]:** The immutable symbol table over every registered file and
//!   its transitive dependencies. Built once at startup, shared read-only afterwards.
//! * **[`ReflectionService`]:** The tonic service answering `ServerReflectionInfo`
//!   streams (`grpc.reflection.v1` and `grpc.reflection.v1alpha`) from the index.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reflector_core::reflection::service::Builder;
//!
//! let reflection = Builder::configure()
//!     .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
//!     .build_v1()?;
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod index;
pub mod reflection;
pub mod registration;

pub use index::{IndexBuildError, ReflectionIndex};
pub use reflection::service::{BuildError, Builder, ReflectionService};
pub use registration::ServiceRegistration;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;
