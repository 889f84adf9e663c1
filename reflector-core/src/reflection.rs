//! # Server Reflection
//!
//! This module implements the server side of the gRPC Server Reflection Protocol.
//!
//! It lets generic clients (`grpcurl`, debuggers, schema explorers) discover
//! the services a server hosts and download their Protobuf schema at runtime, without
//! any pre-shared descriptor files.
//!
//! * [`query`]: the version independent query model and its dispatcher.
//! * [`service`]: the tonic service for `grpc.reflection.v1` and `grpc.reflection.v1alpha`.
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
pub mod query;
pub mod service;
