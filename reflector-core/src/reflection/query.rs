//! # Reflection Queries
//!
//! Version independent model of the reflection protocol and the dispatcher that
//! answers it against a [`ReflectionIndex`].
//!
//! Both `grpc.reflection.v1` and `grpc.reflection.v1alpha` carry the same oneof of
//! query kinds; they are converted into a [`ReflectionQuery`] at the edge, answered by
//! [`ReflectionIndex::resolve`], and the resulting [`ReflectionReply`] or
//! [`QueryError`] is converted back into the wire type of the stream.
use crate::index::{ReflectionIndex, encode_closure};
use tonic::Code;

/// The populated kind of a reflection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionQuery {
    ListServices,
    FileByFilename(String),
    FileContainingSymbol(String),
    FileContainingExtension {
        containing_type: String,
        extension_number: i32,
    },
    AllExtensionNumbersOfType(String),
    /// No query kind was set, or it is not known to this server.
    Unset,
}

impl ReflectionQuery {
    /// The protocol's name for the query kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ReflectionQuery::ListServices => "LIST_SERVICES",
            ReflectionQuery::FileByFilename(_) => "FILE_BY_FILENAME",
            ReflectionQuery::FileContainingSymbol(_) => "FILE_CONTAINING_SYMBOL",
            ReflectionQuery::FileContainingExtension { .. } => "FILE_CONTAINING_EXTENSION",
            ReflectionQuery::AllExtensionNumbersOfType(_) => "ALL_EXTENSION_NUMBERS_OF_TYPE",
            ReflectionQuery::Unset => "MESSAGEREQUEST_NOT_SET",
        }
    }
}

/// A successful answer to a [`ReflectionQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionReply {
    Services(Vec<String>),
    /// Serialized `FileDescriptorProto`s of a file followed by its transitive dependencies.
    FileDescriptors(Vec<Vec<u8>>),
    ExtensionNumbers {
        base_type_name: String,
        extension_numbers: Vec<i32>,
    },
}

/// Expected failures of a query against a healthy index.
///
/// They are reported to the client as an `ErrorResponse` and never end the stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("File not found ({0})")]
    FileNotFound(String),

    #[error("Symbol not found ({0})")]
    SymbolNotFound(String),

    #[error("Extension not found ({containing_type}, {extension_number})")]
    ExtensionNotFound {
        containing_type: String,
        extension_number: i32,
    },

    #[error("Type not found.")]
    TypeNotFound(String),

    #[error("not implemented {0}")]
    Unimplemented(&'static str),
}

impl QueryError {
    pub fn code(&self) -> Code {
        match self {
            QueryError::FileNotFound(_)
            | QueryError::SymbolNotFound(_)
            | QueryError::ExtensionNotFound { .. }
            | QueryError::TypeNotFound(_) => Code::NotFound,
            QueryError::Unimplemented(_) => Code::Unimplemented,
        }
    }
}

impl ReflectionIndex {
    /// Answers a single reflection query.
    pub fn resolve(&self, query: &ReflectionQuery) -> Result<ReflectionReply, QueryError> {
        match query {
            ReflectionQuery::ListServices => Ok(ReflectionReply::Services(
                self.service_names().map(str::to_string).collect(),
            )),

            ReflectionQuery::FileByFilename(name) => self
                .file_by_name(name)
                .map(|file| ReflectionReply::FileDescriptors(encode_closure(file)))
                .ok_or_else(|| QueryError::FileNotFound(name.clone())),

            ReflectionQuery::FileContainingSymbol(symbol) => self
                .file_by_symbol(symbol)
                .map(|file| ReflectionReply::FileDescriptors(encode_closure(file)))
                .ok_or_else(|| QueryError::SymbolNotFound(symbol.clone())),

            ReflectionQuery::FileContainingExtension {
                containing_type,
                extension_number,
            } => u32::try_from(*extension_number)
                .ok()
                .and_then(|number| self.file_by_extension(containing_type, number))
                .map(|file| ReflectionReply::FileDescriptors(encode_closure(file)))
                .ok_or_else(|| QueryError::ExtensionNotFound {
                    containing_type: containing_type.clone(),
                    extension_number: *extension_number,
                }),

            ReflectionQuery::AllExtensionNumbersOfType(containing_type) => {
                let numbers = self.extension_numbers_of_type(containing_type);

                if numbers.is_empty() {
                    return Err(QueryError::TypeNotFound(containing_type.clone()));
                }

                Ok(ReflectionReply::ExtensionNumbers {
                    base_type_name: containing_type.clone(),
                    // Field numbers are capped at 2^29 - 1, so they always fit.
                    extension_numbers: numbers.into_iter().map(|n| n as i32).collect(),
                })
            }

            ReflectionQuery::Unset => Err(QueryError::Unimplemented(query.kind())),
        }
    }
}
