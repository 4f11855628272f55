use color_eyre::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local key-value store: one `<key>.json` file per key under the app
/// data directory. Writes are plain full overwrites; the last writer
/// wins and no atomicity is claimed.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(KvStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read a key's value; a missing file is `None`, not an error.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite a key's value in full.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}
