//! File-backed key/value store
//!
//! All keys live in one JSON object file. Reads are served from memory;
//! writes update memory and wake a background task that rewrites the file
//! (temp file + rename). Writes queued while a rewrite is pending collapse
//! into one, so the latest value per key wins.

use crate::error::{Result, ServerError};
use lyre_playback::{KeyValueStore, PlaybackError};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

enum WriterMessage {
    Dirty,
    Flush(oneshot::Sender<()>),
}

type Values = Arc<Mutex<HashMap<String, String>>>;

pub struct FileStore {
    path: PathBuf,
    values: Values,
    writer: mpsc::UnboundedSender<WriterMessage>,
}

impl FileStore {
    /// Open the store at `path` and start its writer task
    ///
    /// A missing file starts empty. A corrupt file also starts empty (and is
    /// overwritten by the next write) so a bad snapshot never blocks startup.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("State file {:?} is corrupt, starting empty: {}", path, e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Loaded {} stored keys from {:?}", values.len(), path);

        let values: Values = Arc::new(Mutex::new(values));
        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path.clone(), Arc::clone(&values), rx));

        Ok(Self {
            path,
            values,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait until every write issued so far is on disk
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.writer
            .send(WriterMessage::Flush(tx))
            .map_err(|_| ServerError::Storage("state writer stopped".to_string()))?;
        rx.await
            .map_err(|_| ServerError::Storage("state writer stopped".to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> lyre_playback::Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> lyre_playback::Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);

        self.writer
            .send(WriterMessage::Dirty)
            .map_err(|_| PlaybackError::Store("state writer stopped".to_string()))
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

async fn run_writer(
    path: PathBuf,
    values: Values,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    while let Some(first) = rx.recv().await {
        let mut waiters = Vec::new();
        let mut next = Some(first);

        // Collapse everything already queued into a single rewrite
        while let Some(message) = next {
            if let WriterMessage::Flush(waiter) = message {
                waiters.push(waiter);
            }
            next = rx.try_recv().ok();
        }

        if let Err(e) = write_snapshot(&path, &values).await {
            tracing::warn!("Failed to write state file {:?}: {}", path, e);
        }

        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    tracing::debug!("State writer for {:?} stopped", path);
}

async fn write_snapshot(path: &Path, values: &Values) -> Result<()> {
    let snapshot: BTreeMap<String, String> = {
        let values = values.lock().unwrap_or_else(PoisonError::into_inner);
        values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    tracing::debug!("Wrote {} keys to {:?}", snapshot.len(), path);
    Ok(())
}
