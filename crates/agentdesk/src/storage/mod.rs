//! Storage layer for agentdesk.
//!
//! Clients are kept in one JSON array file that is read and rewritten
//! whole on every change, plus a per-client duplicate file and a notes
//! file. See [`layout`] for the directory structure.

pub mod layout;
mod notes;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Client, ClientId};

use self::layout::{temp_path, StoreLayout, EMPTY_CLIENT_LIST};

/// Flat-file client store.
///
/// Provides:
/// - Whole-list reads that degrade to an empty list on a bad file
/// - Append and replace-by-id with a full rewrite of `clients.json`
/// - Per-client duplicate files and notes
///
/// Read-modify-write cycles are serialised through an internal lock and
/// files are replaced by rename, so writers in one process never lose each
/// other's updates. Separate processes sharing a directory are not
/// coordinated.
#[derive(Debug)]
pub struct ClientStore {
    /// Paths below the data directory.
    layout: StoreLayout,
    /// Whether `clients/{id}.json` is maintained.
    write_detail_files: bool,
    /// Held for the whole of every read-modify-write.
    write_lock: Mutex<()>,
}

impl ClientStore {
    /// Open or create a store in the given directory.
    ///
    /// Creates the directory tree and an empty `clients.json` if they don't
    /// exist. An existing file is left untouched, even if malformed.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the initial file cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let layout = StoreLayout::new(dir.as_ref());

        for path in layout.directories() {
            fs::create_dir_all(&path)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: path.clone(),
                    source,
                })?;
        }

        let clients_file = layout.clients_file();
        if !fs::try_exists(&clients_file).await.unwrap_or(false) {
            write_atomic(&clients_file, EMPTY_CLIENT_LIST.as_bytes()).await?;
            debug!("Initialized {}", clients_file.display());
        }

        info!("Client store opened at {}", layout.root().display());
        Ok(Self {
            layout,
            write_detail_files: true,
            write_lock: Mutex::new(()),
        })
    }

    /// Enable or disable the per-client duplicate files.
    #[must_use]
    pub fn with_detail_files(mut self, enabled: bool) -> Self {
        self.write_detail_files = enabled;
        self
    }

    /// Get the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.layout.root()
    }

    /// Get the path of `clients.json`.
    #[must_use]
    pub fn clients_file(&self) -> PathBuf {
        self.layout.clients_file()
    }

    /// Read every client.
    ///
    /// A missing, unreadable or malformed file is logged and yields an
    /// empty list. Inside a well-formed file, records that don't decode as
    /// a client are logged and skipped without hiding the rest.
    pub async fn get_all_clients(&self) -> Vec<Client> {
        match self.load().await {
            Ok(records) => records.iter().filter_map(decode_client).collect(),
            Err(e) => {
                warn!("Error reading clients: {e}");
                Vec::new()
            }
        }
    }

    /// Look up one client.
    ///
    /// `clients.json` is authoritative. The per-client duplicate is only
    /// consulted when the list has no such client or cannot be read.
    pub async fn get_client(&self, id: &ClientId) -> Option<Client> {
        match self.load().await {
            Ok(records) => {
                let listed = records
                    .iter()
                    .filter(|record| record_id(record).as_ref() == Some(id))
                    .find_map(decode_client);
                if listed.is_some() {
                    return listed;
                }
            }
            Err(e) => warn!("Error reading clients, trying detail file: {e}"),
        }

        if self.write_detail_files {
            self.read_detail(id).await
        } else {
            None
        }
    }

    /// Append a client.
    ///
    /// An empty id is replaced with a generated one. Returns the stored
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateClient`] if the id is taken,
    /// [`Error::InvalidClient`] if the id cannot be used as a file name, or
    /// an I/O error. An unreadable `clients.json` is reported rather than
    /// overwritten.
    pub async fn add_client(&self, mut client: Client) -> Result<Client> {
        if client.id.is_empty() {
            client.id = ClientId::generate();
        }
        ensure_path_safe(&client.id)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        if records
            .iter()
            .any(|record| record_id(record).as_ref() == Some(&client.id))
        {
            return Err(Error::duplicate_client(client.id.as_str()));
        }

        records.push(serde_json::to_value(&client)?);
        self.persist(&records).await?;
        self.write_detail(&client).await;

        info!("Added client {} ({} total)", client.id, records.len());
        Ok(client)
    }

    /// Replace the client stored under `id`.
    ///
    /// The stored record keeps `id` whatever the body carried. Returns the
    /// stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientNotFound`] if no client has that id, or an
    /// I/O error.
    pub async fn update_client(&self, id: &ClientId, mut client: Client) -> Result<Client> {
        client.id = id.clone();

        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let slot = records
            .iter_mut()
            .find(|record| record_id(record).as_ref() == Some(id))
            .ok_or_else(|| Error::client_not_found(id.as_str()))?;
        *slot = serde_json::to_value(&client)?;

        self.persist(&records).await?;
        self.write_detail(&client).await;

        info!("Updated client {}", id);
        Ok(client)
    }

    /// Find clients by exact mobile number.
    pub async fn find_by_mobile_number(&self, number: &str) -> Vec<Client> {
        self.get_all_clients()
            .await
            .into_iter()
            .filter(|client| client.mobile_number == number)
            .collect()
    }

    /// Count stored clients.
    pub async fn count(&self) -> usize {
        self.get_all_clients().await.len()
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if `clients.json` cannot be inspected.
    pub async fn stats(&self) -> Result<StoreStats> {
        let clients_file = self.clients_file();
        let clients_file_bytes = fs::metadata(&clients_file)
            .await
            .map(|m| m.len())
            .map_err(|source| Error::FileRead {
                path: clients_file.clone(),
                source,
            })?;

        Ok(StoreStats {
            total_clients: self.count().await,
            clients_file_bytes,
            data_dir: self.layout.root().to_path_buf(),
        })
    }

    /// Check that a client exists, for operations keyed by client id.
    async fn require_client(&self, id: &ClientId) -> Result<()> {
        if self.get_all_clients().await.iter().any(|c| &c.id == id) {
            Ok(())
        } else {
            Err(Error::client_not_found(id.as_str()))
        }
    }

    /// Read `clients.json` as raw records. A missing file is an empty list.
    ///
    /// Records stay untyped so that a rewrite carries entries this version
    /// cannot decode through unchanged.
    async fn load(&self) -> Result<Vec<Value>> {
        let path = self.clients_file();
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(Error::FileRead { path, source }),
        };
        Ok(serde_json::from_str(&data)?)
    }

    /// Rewrite `clients.json` with `records`.
    async fn persist(&self, records: &[Value]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.clients_file(), json.as_bytes()).await
    }

    /// Refresh the duplicate file. Failures only log; the main list is
    /// already written.
    async fn write_detail(&self, client: &Client) {
        if !self.write_detail_files {
            return;
        }
        let Some(path) = self.layout.detail_file(&client.id) else {
            return;
        };

        let result = match serde_json::to_string_pretty(client) {
            Ok(json) => write_atomic(&path, json.as_bytes()).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("Failed to write detail file for client {}: {e}", client.id);
        }
    }

    async fn read_detail(&self, id: &ClientId) -> Option<Client> {
        let path = self.layout.detail_file(id)?;
        let data = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str::<Client>(&data) {
            Ok(client) if &client.id == id => Some(client),
            Ok(_) => {
                warn!("Detail file {} holds another client", path.display());
                None
            }
            Err(e) => {
                warn!("Malformed detail file {}: {e}", path.display());
                None
            }
        }
    }
}

/// The id of a raw record, if it has a usable one.
fn record_id(record: &Value) -> Option<ClientId> {
    record
        .get("id")
        .and_then(|id| ClientId::deserialize(id).ok())
}

/// Decode one raw record, logging and skipping it if it isn't a client.
fn decode_client(record: &Value) -> Option<Client> {
    match Client::deserialize(record) {
        Ok(client) => Some(client),
        Err(e) => {
            let id = record_id(record).map_or_else(|| "?".to_string(), |id| id.to_string());
            warn!("Skipping unreadable client record {id}: {e}");
            None
        }
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of clients in `clients.json`.
    pub total_clients: usize,
    /// Size of `clients.json` in bytes.
    pub clients_file_bytes: u64,
    /// The data directory.
    pub data_dir: PathBuf,
}

/// Reject ids that cannot name a file.
fn ensure_path_safe(id: &ClientId) -> Result<()> {
    if id.is_path_safe() {
        Ok(())
    } else {
        Err(Error::invalid_client(format!(
            "client id {id:?} may only contain letters, digits, '-' and '_'"
        )))
    }
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// The temp file is flushed to disk before the rename so a crash never
/// leaves a truncated `clients.json` behind.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let write_err = |source| Error::FileWrite {
        path: tmp.clone(),
        source,
    };

    let mut file = fs::File::create(&tmp).await.map_err(write_err)?;
    file.write_all(contents).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    if let Err(source) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(Error::FileWrite {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
