//! Local storage for audio attachments referenced by `cid:` URLs.
//!
//! The transport materializes each attachment under a name derived from its
//! content id before the directive that references it is dispatched.  The
//! speech controller only needs to find that file again and delete it once
//! the utterance is over.

pub mod store;

use std::path::{Path, PathBuf};

pub use store::{cache_key, TempDirStore};

/// Resolves content ids to local files and releases them.
pub trait AttachmentStore: Send + Sync {
    /// Deterministic location for `content_id`; the file may not exist.
    fn path_for(&self, content_id: &str) -> PathBuf;

    /// Delete a resolved file.  Best effort: failures are logged, never
    /// returned.
    fn release(&self, path: &Path);
}
