//! # CLI
//!
//! This module defines the command-line interface of `reflector` using `clap`.
//!
//! Every setting can be passed as a flag; the listen address also falls back to the
//! `REFLECTOR_ADDR` environment variable.
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf};

#[derive(Parser)]
#[command(
    name = "reflector",
    version,
    about = "gRPC Server Reflection for Protobuf descriptor sets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the gRPC Server Reflection Protocol (v1 and v1alpha)
    ///
    /// Every service declared in the given descriptor sets is listed and described.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// reflector serve --addr 127.0.0.1:50051 descriptors.bin
    /// ```
    Serve {
        /// Address to listen on
        #[arg(long, env = "REFLECTOR_ADDR", default_value = "[::1]:50051")]
        addr: SocketAddr,

        /// Do not list the reflection service itself
        #[arg(long)]
        no_reflection_schema: bool,

        /// Encoded `FileDescriptorSet` files (e.g. generated with `protoc --descriptor_set_out`)
        #[arg(required = true)]
        descriptor_sets: Vec<PathBuf>,
    },

    /// Build the reflection index and print it as JSON
    ///
    /// Useful to check that a set of descriptors indexes without collisions before serving it.
    Inspect {
        /// Encoded `FileDescriptorSet` files
        #[arg(required = true)]
        descriptor_sets: Vec<PathBuf>,
    },
}
