//! # Reflection Index
//!
//! The immutable symbol table answering every reflection query.
//!
//! A [`ReflectionIndex`] is built exactly once from the final list of
//! [`ServiceRegistration`]s of a server. Building walks the dependency graph of every
//! registered service's file breadth-first, visiting each file once, and registers:
//!
//! * every file by name,
//! * every service, method and message type by fully-qualified name,
//! * every extension by `(containing type, field number)`.
//!
//! Each of those namespaces must be free of collisions; a collision aborts the build
//! with an [`IndexBuildError`]. Once built, the index is never mutated and can be
//! shared by reference (usually behind an `Arc`) between any number of concurrent
//! reflection streams.
mod closure;
mod walker;


pub use closure::{encode_closure, file_closure};

use crate::registration::ServiceRegistration;
use prost_reflect::FileDescriptor;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use walker::IndexBuilder;

/// Schema inconsistencies detected while building a [`ReflectionIndex`].
///
/// They signal two distinct schema files defining the same name and are never
/// recoverable: the server should refuse to start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexBuildError {
    #[error("File name already used: {0}")]
    DuplicateFile(String),

    #[error("Service already defined: {0}")]
    DuplicateService(String),

    #[error("Method already defined: {method} in {service}")]
    DuplicateMethod { service: String, method: String },

    #[error("Type already defined: {0}")]
    DuplicateType(String),

    #[error("Extension name {containing_type} and number {number} are already defined")]
    DuplicateExtension { containing_type: String, number: u32 },
}

/// Lookup tables over the schema of every descriptor-backed service of a server.
#[derive(Debug, Clone, Default)]
pub struct ReflectionIndex {
    service_names: BTreeSet<String>,
    by_file_name: HashMap<String, FileDescriptor>,
    by_symbol: HashMap<String, FileDescriptor>,
    by_extension: HashMap<String, BTreeMap<u32, FileDescriptor>>,
}

impl ReflectionIndex {
    /// Builds the index from the registered services, in registration order.
    ///
    /// Registrations without a file descriptor are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(index)` - Every reachable file was indexed without collisions.
    /// * `Err(IndexBuildError)` - Two files define the same file name, symbol or extension,
    ///   or the same service was registered twice.
    pub fn build<I>(registrations: I) -> Result<Self, IndexBuildError>
    where
        I: IntoIterator<Item = ServiceRegistration>,
    {
        let mut builder = IndexBuilder::default();

        for registration in registrations {
            builder.register(registration)?;
        }

        let index = builder.finish()?;

        tracing::info!(
            services = index.service_names.len(),
            files = index.by_file_name.len(),
            symbols = index.by_symbol.len(),
            extensions = index.by_extension.values().map(BTreeMap::len).sum::<usize>(),
            "Reflection index built"
        );

        Ok(index)
    }

    /// Fully-qualified names of every registered, descriptor-backed service, sorted.
    pub fn service_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.service_names.iter().map(String::as_str)
    }

    /// The file registered under `name` (e.g. `my/package/v1/service.proto`).
    pub fn file_by_name(&self, name: &str) -> Option<&FileDescriptor> {
        self.by_file_name.get(name)
    }

    /// The file declaring the service, method or message type named `symbol`.
    pub fn file_by_symbol(&self, symbol: &str) -> Option<&FileDescriptor> {
        self.by_symbol.get(symbol)
    }

    /// The file declaring extension `number` of the message type `containing_type`.
    pub fn file_by_extension(&self, containing_type: &str, number: u32) -> Option<&FileDescriptor> {
        self.by_extension
            .get(containing_type)
            .and_then(|extensions| extensions.get(&number))
    }

    /// Field numbers of every registered extension of `containing_type`, ascending.
    ///
    /// Unknown types and types without extensions both yield an empty list.
    pub fn extension_numbers_of_type(&self, containing_type: &str) -> Vec<u32> {
        self.by_extension
            .get(containing_type)
            .map(|extensions| extensions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Names of every indexed file, sorted.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.by_file_name.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    /// Every indexed symbol, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.by_symbol.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Every extended type with the field numbers of its extensions.
    pub fn extensions(&self) -> BTreeMap<&str, Vec<u32>> {
        self.by_extension
            .iter()
            .map(|(containing_type, numbers)| {
                (containing_type.as_str(), numbers.keys().copied().collect())
            })
            .collect()
    }
}
