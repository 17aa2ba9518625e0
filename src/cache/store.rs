//! [`TempDirStore`]: attachments as `<key>.mp3` files in one directory.

use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;

use super::AttachmentStore;

const KEY_LEN: usize = 8;

/// File stem for `content_id`: the first eight characters of its URL-safe
/// base64 encoding.
///
/// ```
/// use speech_synthesizer::cache::cache_key;
///
/// assert_eq!(cache_key("abc"), "YWJj");
/// assert_eq!(cache_key("abc"), cache_key("abc"));
/// assert_eq!(cache_key("DuerOS_0123456789").len(), 8);
/// ```
pub fn cache_key(content_id: &str) -> String {
    let encoded = URL_SAFE.encode(content_id.as_bytes());
    encoded.chars().take(KEY_LEN).collect()
}

/// Attachment store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct TempDirStore {
    dir: PathBuf,
}

impl TempDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the OS temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an attachment body so a later `cid:` reference resolves to it.
    pub fn store(&self, content_id: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(content_id);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl Default for TempDirStore {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

impl AttachmentStore for TempDirStore {
    fn path_for(&self, content_id: &str) -> PathBuf {
        self.dir.join(format!("{}.mp3", cache_key(content_id)))
    }

    fn release(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("cache: removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("cache: {} already gone", path.display());
            }
            Err(e) => log::warn!("cache: cannot remove {}: {e}", path.display()),
        }
    }
}
