//! Persistent dependency cache
//!
//! Restores previously saved dependency directories when the toolchain that
//! built them is unchanged, and saves them again after a successful build.
//!
//! # Cache Status
//!
//! | Status | Restore | Description |
//! |--------|---------|-------------|
//! | disabled | no | Caching turned off by config |
//! | no-cache | no | No signature record, nothing saved yet |
//! | new-signature | no | Toolchain or directory set changed |
//! | valid | yes | Signature matches this build |
//!
//! Copies always replace whole subtrees, and a save clears the cache root
//! first so nothing from an earlier directory set survives.

pub mod archive;
pub mod coordinator;
pub mod directories;
pub mod fingerprint;
pub mod layout;
pub mod signature;
pub mod status;

pub use archive::{ArchiveEntry, ArchiveOutcome, ArchiveReport};
pub use coordinator::{CacheContext, CacheCoordinator, Phase, RestoreReport, SaveReport};
pub use directories::{CacheDirectorySet, DirectorySource};
pub use fingerprint::{compute_fingerprint, Fingerprint, ToolchainIdentity, UNKNOWN};
pub use layout::CacheLayout;
pub use signature::{read_signature, write_signature};
pub use status::{resolve, resolve_for_set, CacheStatus};
