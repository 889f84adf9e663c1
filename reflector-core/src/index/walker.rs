use super::{IndexBuildError, ReflectionIndex};
use crate::registration::ServiceRegistration;
use prost_reflect::{ExtensionDescriptor, FileDescriptor, MessageDescriptor, ServiceDescriptor};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque, hash_map::Entry};

/// Accumulates registrations and walks their file dependency graph breadth-first.
///
/// Files are queued at most once (keyed by file name), so a file shared by many
/// dependants, as in a diamond, is processed a single time.
#[derive(Default)]
pub(super) struct IndexBuilder {
    seen_files: HashSet<String>,
    queue: VecDeque<FileDescriptor>,
    service_names: BTreeSet<String>,
    by_file_name: HashMap<String, FileDescriptor>,
    by_symbol: HashMap<String, FileDescriptor>,
    by_extension: HashMap<String, BTreeMap<u32, FileDescriptor>>,
}

impl IndexBuilder {
    pub(super) fn register(
        &mut self,
        registration: ServiceRegistration,
    ) -> Result<(), IndexBuildError> {
        let (name, file) = registration.into_parts();

        let Some(file) = file else {
            tracing::debug!(service = %name, "Skipping service without a file descriptor");
            return Ok(());
        };

        if self.service_names.contains(&name) {
            return Err(IndexBuildError::DuplicateService(name));
        }

        self.service_names.insert(name);
        self.enqueue(file);

        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<ReflectionIndex, IndexBuildError> {
        while let Some(file) = self.queue.pop_front() {
            self.process_file(&file)?;

            for dependency in file.dependencies() {
                self.enqueue(dependency);
            }
        }

        Ok(ReflectionIndex {
            service_names: self.service_names,
            by_file_name: self.by_file_name,
            by_symbol: self.by_symbol,
            by_extension: self.by_extension,
        })
    }

    fn enqueue(&mut self, file: FileDescriptor) {
        if self.seen_files.insert(file.name().to_string()) {
            self.queue.push_back(file);
        }
    }

    pub(super) fn process_file(&mut self, file: &FileDescriptor) -> Result<(), IndexBuildError> {
        match self.by_file_name.entry(file.name().to_string()) {
            Entry::Occupied(entry) => {
                return Err(IndexBuildError::DuplicateFile(entry.key().clone()));
            }
            Entry::Vacant(entry) => {
                entry.insert(file.clone());
            }
        }

        for service in file.services() {
            self.process_service(&service, file)?;
        }

        // Nested types are walked with a queue rather than recursion.
        let mut messages: VecDeque<MessageDescriptor> = file.messages().collect();

        while let Some(message) = messages.pop_front() {
            if !self.insert_symbol(message.full_name(), file) {
                return Err(IndexBuildError::DuplicateType(
                    message.full_name().to_string(),
                ));
            }

            for extension in message.child_extensions() {
                self.process_extension(&extension, file)?;
            }

            messages.extend(message.child_messages());
        }

        for extension in file.extensions() {
            self.process_extension(&extension, file)?;
        }

        Ok(())
    }

    fn process_service(
        &mut self,
        service: &ServiceDescriptor,
        file: &FileDescriptor,
    ) -> Result<(), IndexBuildError> {
        if !self.insert_symbol(service.full_name(), file) {
            return Err(IndexBuildError::DuplicateService(
                service.full_name().to_string(),
            ));
        }

        for method in service.methods() {
            if !self.insert_symbol(method.full_name(), file) {
                return Err(IndexBuildError::DuplicateMethod {
                    service: service.full_name().to_string(),
                    method: method.full_name().to_string(),
                });
            }
        }

        Ok(())
    }

    fn process_extension(
        &mut self,
        extension: &ExtensionDescriptor,
        file: &FileDescriptor,
    ) -> Result<(), IndexBuildError> {
        let containing_message = extension.containing_message();
        let containing_type = containing_message.full_name();
        let number = extension.number();

        let extensions = self
            .by_extension
            .entry(containing_type.to_string())
            .or_default();

        if extensions.contains_key(&number) {
            return Err(IndexBuildError::DuplicateExtension {
                containing_type: containing_type.to_string(),
                number,
            });
        }

        extensions.insert(number, file.clone());

        Ok(())
    }

    /// Returns `false` when the symbol was already taken.
    fn insert_symbol(&mut self, symbol: &str, file: &FileDescriptor) -> bool {
        match self.by_symbol.entry(symbol.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(file.clone());
                true
            }
        }
    }
}
