//! # Reflector CLI Entry Point
//!
//! The main executable for the Reflector tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs
//!    the `tracing` subscriber (filtered through `RUST_LOG`).
//! 2. **Indexing**: Reads the descriptor sets and builds the reflection index via
//!    `reflector_core`. Any schema collision aborts startup.
//! 3. **Execution**: Serves the reflection service until `Ctrl-C`, or prints the index.
mod cli;
mod summary;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use reflector_core::{Builder, ReflectionService, tonic::transport::Server};
use std::{net::SocketAddr, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Serve {
            addr,
            no_reflection_schema,
            descriptor_sets,
        } => serve(addr, !no_reflection_schema, &descriptor_sets).await,
        Commands::Inspect { descriptor_sets } => inspect(&descriptor_sets),
    }
}

async fn serve(
    addr: SocketAddr,
    include_reflection_service: bool,
    descriptor_sets: &[PathBuf],
) -> anyhow::Result<()> {
    let encoded = read_descriptor_sets(descriptor_sets)?;
    let service = build_service(&encoded, include_reflection_service)?;

    tracing::info!(
        %addr,
        services = service.index().service_names().len(),
        "Serving gRPC server reflection"
    );

    Server::builder()
        .add_service(service.clone().into_v1_server())
        .add_service(service.into_v1alpha_server())
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .with_context(|| format!("Failed to serve on '{addr}'"))?;

    tracing::info!("Server stopped");

    Ok(())
}

fn inspect(descriptor_sets: &[PathBuf]) -> anyhow::Result<()> {
    let encoded = read_descriptor_sets(descriptor_sets)?;
    let service = build_service(&encoded, false)?;

    let summary = summary::index_summary(service.index());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn read_descriptor_sets(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<u8>>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read(path)
                .with_context(|| format!("Failed to read descriptor set '{}'", path.display()))
        })
        .collect()
}

fn build_service(
    encoded: &[Vec<u8>],
    include_reflection_service: bool,
) -> anyhow::Result<ReflectionService> {
    encoded
        .iter()
        .fold(
            Builder::configure().include_reflection_service(include_reflection_service),
            |builder, set| builder.register_encoded_file_descriptor_set(set),
        )
        .build()
        .context("Failed to build the reflection index")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}
