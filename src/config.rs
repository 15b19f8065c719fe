// Local configuration: the auth file (`~/.slyftrc`) behind the
// `ConfigStore` interface, and the per-directory project lock file.
//
// The file store opens the file for each call and keeps nothing in memory,
// so independent commands always see the latest session.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::Auth;

/// Name of the auth file in the user's home directory.
pub const CONFIG_FILE_NAME: &str = ".slyftrc";
/// Name of the project lock file in the working directory.
pub const PROJECT_LOCK_FILE: &str = ".slyftproject";

/// Storage for the session credentials.
pub trait ConfigStore {
    /// Read the stored session. A missing file yields an empty `Auth`.
    fn read_auth(&self) -> Result<Auth>;
    fn write_auth(&self, auth: &Auth) -> Result<()>;

    fn clear_auth(&self) -> Result<()> {
        self.write_auth(&Auth::default())
    }
}

/// On-disk layout of the auth file. Unknown top-level keys survive a
/// rewrite.
#[derive(Serialize, Deserialize, Debug, Default)]
struct RcFile {
    #[serde(rename = "Auth", default)]
    auth: Auth,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// `ConfigStore` backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigStore { path: path.into() }
    }

    /// Store located at `~/.slyftrc`.
    pub fn in_home_dir() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
        Ok(Self::new(home.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<RcFile> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file yet");
                return Ok(RcFile::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        serde_json::from_slice(&data)
            .with_context(|| format!("parsing config file {}", self.path.display()))
    }
}

impl ConfigStore for FileConfigStore {
    fn read_auth(&self) -> Result<Auth> {
        Ok(self.read_file()?.auth)
    }

    fn write_auth(&self, auth: &Auth) -> Result<()> {
        // A corrupt file is replaced rather than blocking a fresh login.
        let mut rc = self.read_file().unwrap_or_default();
        rc.auth = auth.clone();

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        rc.serialize(&mut ser).context("serializing config")?;

        fs::write(&self.path, out)
            .with_context(|| format!("writing config file {}", self.path.display()))?;
        debug!(path = %self.path.display(), "config written");
        Ok(())
    }
}

/// First line of the project lock file in `dir`, if there is one.
pub fn read_project_lock(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join(PROJECT_LOCK_FILE)).ok()?;
    let name = content.lines().next()?.trim();
    if name.is_empty() {
        return None;
    }
    debug!(project = name, "operating on project from {PROJECT_LOCK_FILE}");
    Some(name.to_string())
}
