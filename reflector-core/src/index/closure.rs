use prost_reflect::FileDescriptor;
use std::collections::{HashSet, VecDeque};

/// Returns `root` followed by every file it transitively depends on.
///
/// Files appear exactly once, in breadth-first discovery order, so a file reached
/// through several paths (e.g. the bottom of a diamond) is listed a single time.
pub fn file_closure(root: &FileDescriptor) -> Vec<FileDescriptor> {
    let mut seen = HashSet::from([root.name().to_string()]);
    let mut frontier = VecDeque::from([root.clone()]);
    let mut closure = Vec::new();

    while let Some(file) = frontier.pop_front() {
        for dependency in file.dependencies() {
            if seen.insert(dependency.name().to_string()) {
                frontier.push_back(dependency);
            }
        }

        closure.push(file);
    }

    closure
}

/// Serialized `FileDescriptorProto` of every file in the closure of `root`, in the
/// order of [`file_closure`].
pub fn encode_closure(root: &FileDescriptor) -> Vec<Vec<u8>> {
    file_closure(root)
        .iter()
        .map(FileDescriptor::encode_to_vec)
        .collect()
}
