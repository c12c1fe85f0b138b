//! Single-file durable provider.

use crate::error::{StorageError, StorageResult};
use crate::log::{self, LogRecord};
use crate::provider::{ProviderState, ReadContext, StorageProvider, WriteContext};
use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for a [`FileProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileConfig {
    /// Whether to `fsync` after every mutation.
    pub sync_on_write: bool,
    /// Whether to create missing parent directories on open.
    pub create_dirs: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
            create_dirs: true,
        }
    }
}

impl FileConfig {
    /// Sets whether each write is synced to disk.
    #[must_use]
    pub const fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Sets whether parent directories are created.
    #[must_use]
    pub const fn create_dirs(mut self, enabled: bool) -> Self {
        self.create_dirs = enabled;
        self
    }
}

#[derive(Debug)]
struct FileInner {
    state: ProviderState,
    file: Option<File>,
    entries: BTreeMap<String, Vec<u8>>,
    size: u64,
}

impl FileInner {
    fn ensure_open(&self) -> StorageResult<()> {
        match self.state.require_open() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn file_mut(&mut self) -> StorageResult<&mut File> {
        self.file.as_mut().ok_or(StorageError::NotOpen)
    }

    fn apply(&mut self, record: LogRecord) {
        match record {
            LogRecord::Put { key, value } => {
                self.entries.insert(key, value);
            }
            LogRecord::Delete { key } => {
                self.entries.remove(&key);
            }
            LogRecord::Clear => self.entries.clear(),
        }
    }
}

/// A provider persisting to an append-only record log.
///
/// Every mutation appends one CRC-checked frame; `open` replays the log into
/// memory. An exclusive advisory lock is held from `open` until `close` (or
/// drop), so only one process uses a store at a time.
///
/// # Durability
///
/// With [`FileConfig::sync_on_write`] (the default) each mutation is synced
/// before it resolves. A frame torn by a crash is dropped on the next open.
///
/// # Example
///
/// ```no_run
/// use sealstore_storage::{FileProvider, StorageProvider, WriteContext};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = FileProvider::new(Path::new("store.slog"));
/// provider.open().await.unwrap();
/// provider.read_write_context().unwrap().put("k", b"v").await.unwrap();
/// provider.close().await.unwrap();
/// # }
/// ```
#[derive(Debug)]
pub struct FileProvider {
    path: PathBuf,
    config: FileConfig,
    inner: RwLock<FileInner>,
}

impl FileProvider {
    /// Creates a provider for `path` with default options.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self::with_config(path, FileConfig::default())
    }

    /// Creates a provider for `path`.
    #[must_use]
    pub fn with_config(path: &Path, config: FileConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            config,
            inner: RwLock::new(FileInner {
                state: ProviderState::Unopened,
                file: None,
                entries: BTreeMap::new(),
                size: 0,
            }),
        }
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProviderState {
        self.inner.read().state
    }

    /// Returns the size of the log file in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] if the provider is not open.
    pub fn file_size(&self) -> StorageResult<u64> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner.size)
    }

    /// Lists live keys in order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] if the provider is not open.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner.entries.keys().cloned().collect())
    }

    /// Returns the number of live keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotOpen`] if the provider is not open.
    pub fn entry_count(&self) -> StorageResult<usize> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner.entries.len())
    }

    /// Rewrites the log so it holds only live records.
    ///
    /// The new log is written beside the old one and renamed over it, so a
    /// crash mid-compaction leaves the old log intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not open or an I/O error occurs.
    pub fn compact(&self) -> StorageResult<()> {
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let tmp_path = compaction_path(&self.path);
        let mut data = Vec::new();
        for (key, value) in &inner.entries {
            let record = LogRecord::Put {
                key: key.clone(),
                value: value.clone(),
            };
            data.extend_from_slice(&record.encode()?);
        }

        let mut tmp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&tmp_path)?;
        tmp.try_lock_exclusive().map_err(|_| StorageError::Locked)?;
        tmp.set_len(0)?;
        tmp.write_all(&data)?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        let before = inner.size;
        inner.size = data.len() as u64;
        inner.file = Some(tmp);

        debug!(
            provider = "file",
            path = %self.path.display(),
            before,
            after = inner.size,
            "compacted"
        );
        Ok(())
    }

    fn append(&self, record: LogRecord) -> StorageResult<()> {
        let frame = record.encode()?;
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        let sync = self.config.sync_on_write;
        let offset = inner.size;
        let file = inner.file_mut()?;
        append_frame(file, offset, &frame, sync, &self.path)?;

        inner.size += frame.len() as u64;
        inner.apply(record);
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner.entries.get(key).cloned())
    }
}

#[async_trait]
impl StorageProvider for FileProvider {
    type ReadOnly<'a> = FileReadContext<'a>;
    type ReadWrite<'a> = FileWriteContext<'a>;

    fn is_supported() -> bool {
        true
    }

    fn name(&self) -> &str {
        "file"
    }

    async fn open(&self) -> StorageResult<bool> {
        let mut inner = self.inner.write();
        match inner.state {
            ProviderState::Opened => return Ok(false),
            ProviderState::Closed => return Err(StorageError::Closed),
            ProviderState::Unopened | ProviderState::Opening => {}
        }

        if self.config.create_dirs {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.try_lock_exclusive().map_err(|_| StorageError::Locked)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let first_access = data.is_empty();

        let replay = log::replay(&data)?;
        if replay.is_torn(data.len()) {
            warn!(
                provider = "file",
                path = %self.path.display(),
                discarded = data.len() - replay.valid_len,
                "truncating torn log tail"
            );
            file.set_len(replay.valid_len as u64)?;
            file.sync_all()?;
        }

        inner.entries.clear();
        for record in replay.records {
            inner.apply(record);
        }
        inner.size = replay.valid_len as u64;
        inner.file = Some(file);
        inner.state = ProviderState::Opened;

        debug!(
            provider = "file",
            path = %self.path.display(),
            first_access,
            entries = inner.entries.len(),
            "opened"
        );
        Ok(first_access)
    }

    async fn close(&self) -> StorageResult<()> {
        let mut inner = self.inner.write();
        if let Some(file) = inner.file.take() {
            file.sync_all()?;
            if let Err(err) = FileExt::unlock(&file) {
                warn!(
                    provider = "file",
                    path = %self.path.display(),
                    error = %err,
                    "failed to release log lock"
                );
            }
        }
        inner.entries.clear();
        inner.state = ProviderState::Closed;
        debug!(provider = "file", path = %self.path.display(), "closed");
        Ok(())
    }

    fn read_only_context(&self) -> StorageResult<FileReadContext<'_>> {
        self.inner.read().ensure_open()?;
        Ok(FileReadContext { provider: self })
    }

    fn read_write_context(&self) -> StorageResult<FileWriteContext<'_>> {
        self.inner.read().ensure_open()?;
        Ok(FileWriteContext { provider: self })
    }
}

/// Read-only context over a [`FileProvider`].
#[derive(Debug, Clone, Copy)]
pub struct FileReadContext<'a> {
    provider: &'a FileProvider,
}

/// Read-write context over a [`FileProvider`].
#[derive(Debug, Clone, Copy)]
pub struct FileWriteContext<'a> {
    provider: &'a FileProvider,
}

#[async_trait]
impl ReadContext for FileReadContext<'_> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.provider.get(key)
    }
}

#[async_trait]
impl ReadContext for FileWriteContext<'_> {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.provider.get(key)
    }
}

#[async_trait]
impl WriteContext for FileWriteContext<'_> {
    async fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.provider.append(LogRecord::Put {
            key: key.to_string(),
            value: value.to_vec(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.provider.get(key)?.is_none() {
            return Ok(());
        }
        self.provider.append(LogRecord::Delete {
            key: key.to_string(),
        })
    }

    async fn clear(&self) -> StorageResult<()> {
        self.provider.append(LogRecord::Clear)
    }
}

/// Temporary file written during compaction. Always distinct from `path`.
fn compaction_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".compact.tmp");
    path.with_file_name(name)
}

/// What an append needs from the log file.
trait LogFile: Write + Seek {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Writes `frame` at `offset`, the end of the valid log.
///
/// On any failure the file is cut back to `offset`, so neither a partial
/// frame nor an unacknowledged one is replayed later.
fn append_frame<F: LogFile>(
    file: &mut F,
    offset: u64,
    frame: &[u8],
    sync: bool,
    path: &Path,
) -> io::Result<()> {
    if let Err(err) = write_frame(file, offset, frame, sync) {
        if let Err(rollback) = file.truncate_to(offset) {
            warn!(
                provider = "file",
                path = %path.display(),
                offset,
                error = %rollback,
                "failed to roll back partial append"
            );
        }
        return Err(err);
    }
    Ok(())
}

fn write_frame<F: LogFile>(file: &mut F, offset: u64, frame: &[u8], sync: bool) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(frame)?;
    if sync {
        file.sync()?;
    }
    Ok(())
}
