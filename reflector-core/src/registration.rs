//! # Service Registration
//!
//! The records a server hands to [`ReflectionIndex::build`](crate::index::ReflectionIndex::build),
//! one per hosted service.
//!
//! A registration always carries the fully-qualified service name and, when the
//! service is backed by a Protobuf schema, the file descriptor declaring it. Services
//! without a descriptor are accepted and simply left out of the index.
use prost_reflect::{DescriptorPool, FileDescriptor, ServiceDescriptor};
use tonic::server::NamedService;

#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    name: String,
    file: Option<FileDescriptor>,
}

impl ServiceRegistration {
    pub fn new(name: impl Into<String>, file: Option<FileDescriptor>) -> Self {
        Self {
            name: name.into(),
            file,
        }
    }

    /// A service hosted without any schema descriptor.
    pub fn without_descriptor(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Looks `name` up in `pool`; the registration has no descriptor when the pool
    /// does not declare such service.
    pub fn from_pool(pool: &DescriptorPool, name: &str) -> Self {
        let file = pool
            .get_service_by_name(name)
            .map(|service| service.parent_file());

        Self::new(name, file)
    }

    /// Registration for a tonic server type, resolved by its [`NamedService::NAME`].
    ///
    /// ```rust,ignore
    /// let registration = ServiceRegistration::named::<GreeterServer<MyGreeter>>(&pool);
    /// ```
    pub fn named<S: NamedService>(pool: &DescriptorPool) -> Self {
        Self::from_pool(pool, S::NAME)
    }

    /// One registration per service declared anywhere in `pool`.
    pub fn all_from_pool(pool: &DescriptorPool) -> impl Iterator<Item = Self> + '_ {
        pool.services().map(|service| Self::from(&service))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> Option<&FileDescriptor> {
        self.file.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<FileDescriptor>) {
        (self.name, self.file)
    }
}

impl From<&ServiceDescriptor> for ServiceRegistration {
    fn from(service: &ServiceDescriptor) -> Self {
        Self::new(service.full_name(), Some(service.parent_file()))
    }
}
