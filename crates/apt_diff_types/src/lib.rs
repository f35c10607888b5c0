//! Shared data model for apt-diff: paths, hashes, the dpkg state trie, and
//! the discrepancy vocabulary the traversal driver and differ report in.

pub mod filter;
pub mod hash;
pub mod intern;
pub mod package_info;
pub mod path;
pub mod pipeline;
pub mod report;
pub mod trie;

pub use filter::PathFilter;
pub use hash::Hash;
pub use intern::PackageRef;
pub use package_info::ConffileStatus;
pub use package_info::PackageInfo;
pub use path::AbsolutePath;
pub use trie::FilesystemNode;
