//! JSON file token storage.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use authwire_core::error::StorageError;
use authwire_core::{Error, Result, Token, TokenStore};

fn map_io(err: std::io::Error) -> Error {
    StorageError::new(format!("IO error: {}", err)).into()
}

/// Token store backed by a single JSON file.
///
/// The token is cached in memory; [`read`](TokenStore::read) never touches
/// the disk. Every write goes to a temporary file that is renamed over the
/// session file while an exclusive lock is held on `<path>.lock`.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<Token>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading any session already saved there.
    ///
    /// A missing file means logged out. A file that cannot be parsed is an
    /// error rather than a silent logout.
    #[instrument(skip_all)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let token = load(&path)?;
        debug!(path = %path.display(), logged_in = token.is_some(), "Opened token file");

        Ok(Self {
            path,
            cached: RwLock::new(token),
        })
    }

    /// Get the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the session file, picking up writes from other processes.
    pub fn reload(&self) -> Result<Option<Token>> {
        let lock = self.lock()?;
        let token = load(&self.path);
        lock.unlock().map_err(map_io)?;
        let token = token?;

        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = token.clone();
        Ok(token)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.sibling(".lock"))
            .map_err(map_io)?;
        lock_file.lock_exclusive().map_err(map_io)?;
        Ok(lock_file)
    }

    fn save(&self, token: &Token) -> Result<()> {
        let content = serde_json::to_vec_pretty(token)?;
        let tmp_path = self.sibling(".tmp");

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path).map_err(map_io)?;
        file.write_all(&content).map_err(map_io)?;
        file.sync_all().map_err(map_io)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(map_io)
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io(err)),
        }
    }
}

fn load(path: &Path) -> Result<Option<Token>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(map_io(err)),
    };

    match serde_json::from_slice(&content) {
        Ok(token) => Ok(Some(token)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Unreadable token file");
            Err(err.into())
        }
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Option<Token> {
        self.cached.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[instrument(skip(self, token), fields(path = %self.path.display(), clear = token.is_none()))]
    fn write(&self, token: Option<Token>) -> Result<()> {
        let lock = self.lock()?;
        let result = match &token {
            Some(token) => self.save(token),
            None => self.remove(),
        };
        lock.unlock().map_err(map_io)?;
        result?;

        debug!("Token file updated");
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = token;
        Ok(())
    }
}
