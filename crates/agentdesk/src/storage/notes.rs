//! Per-client notes, one text file per client.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use super::{ensure_path_safe, write_atomic, ClientStore};
use crate::error::{Error, Result};
use crate::model::{ClientId, ClientNotes};

impl ClientStore {
    /// Get the notes saved for a client. Empty if none were saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientNotFound`] if the client does not exist,
    /// [`Error::InvalidClient`] if its id cannot name a file, or an I/O error
    /// if the notes file exists but cannot be read.
    pub async fn get_notes(&self, id: &ClientId) -> Result<ClientNotes> {
        ensure_path_safe(id)?;
        self.require_client(id).await?;

        let path = notes_path(self, id)?;
        let notes = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(Error::FileRead { path, source }),
        };

        Ok(ClientNotes {
            client_id: id.clone(),
            notes,
        })
    }

    /// Replace the notes saved for a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientNotFound`] if the client does not exist,
    /// [`Error::InvalidClient`] if its id cannot name a file, or an I/O error.
    pub async fn save_notes(&self, id: &ClientId, notes: impl Into<String>) -> Result<ClientNotes> {
        ensure_path_safe(id)?;
        self.require_client(id).await?;

        let notes = notes.into();
        let path = notes_path(self, id)?;

        let _guard = self.write_lock.lock().await;
        write_atomic(&path, notes.as_bytes()).await?;
        debug!("Saved {} bytes of notes for client {}", notes.len(), id);

        Ok(ClientNotes {
            client_id: id.clone(),
            notes,
        })
    }
}

fn notes_path(store: &ClientStore, id: &ClientId) -> Result<PathBuf> {
    store
        .layout
        .notes_file(id)
        .ok_or_else(|| Error::internal("path-safe id produced no notes path"))
}
