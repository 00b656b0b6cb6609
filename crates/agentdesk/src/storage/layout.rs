//! On-disk layout of the client store.
//!
//! ```text
//! <data_dir>/
//!     clients.json        all clients, one JSON array
//!     clients/{id}.json   per-client duplicate
//!     notes/{id}.txt      per-client notes
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::ClientId;

/// File holding the full client list.
pub const CLIENTS_FILE_NAME: &str = "clients.json";

/// Directory of per-client duplicates.
pub const DETAIL_DIR_NAME: &str = "clients";

/// Directory of per-client notes.
pub const NOTES_DIR_NAME: &str = "notes";

/// Contents written to a fresh `clients.json`.
pub const EMPTY_CLIENT_LIST: &str = "[]";

/// Resolves store paths below one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    /// Create a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `clients.json`.
    #[must_use]
    pub fn clients_file(&self) -> PathBuf {
        self.root.join(CLIENTS_FILE_NAME)
    }

    /// Directory of per-client duplicates.
    #[must_use]
    pub fn detail_dir(&self) -> PathBuf {
        self.root.join(DETAIL_DIR_NAME)
    }

    /// Directory of notes files.
    #[must_use]
    pub fn notes_dir(&self) -> PathBuf {
        self.root.join(NOTES_DIR_NAME)
    }

    /// Path of the duplicate for `id`, or `None` if the id is not usable
    /// as a file name.
    #[must_use]
    pub fn detail_file(&self, id: &ClientId) -> Option<PathBuf> {
        id.is_path_safe()
            .then(|| self.detail_dir().join(format!("{id}.json")))
    }

    /// Path of the notes file for `id`, or `None` if the id is not usable
    /// as a file name.
    #[must_use]
    pub fn notes_file(&self, id: &ClientId) -> Option<PathBuf> {
        id.is_path_safe()
            .then(|| self.notes_dir().join(format!("{id}.txt")))
    }

    /// Every directory the store needs.
    #[must_use]
    pub fn directories(&self) -> [PathBuf; 3] {
        [self.root.clone(), self.detail_dir(), self.notes_dir()]
    }
}

/// Fresh sibling path used while replacing `path`.
///
/// Names carry the process id and a per-process counter, so concurrent
/// writers never share a temp file.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}.{seq}.tmp", std::process::id()));
    PathBuf::from(name)
}
