use {
    crate::{DraftConfig, Result},
    civic_types::Draft,
    std::{
        fs,
        io::ErrorKind,
        path::{Path, PathBuf},
    },
    tracing::debug,
};

/// Keeps one in-progress submission on disk as JSON.
#[derive(Debug, Clone)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    pub fn from_config(config: &DraftConfig) -> Self {
        Self::new(&config.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, draft: &Draft) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_json::to_vec_pretty(draft)?)?;
        debug!(path = %self.path.display(), "Draft saved");

        Ok(())
    }

    /// `None` if no draft has been saved.
    pub fn load(&self) -> Result<Option<Draft>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Draft cleared");
                Ok(())
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// ----------------------------------- tests -----------------------------------
