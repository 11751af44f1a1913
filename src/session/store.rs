//! Persistent token store.
//!
//! One durable slot for the bearer token, kept in `state.kdl` under the
//! data directory. The file holds a secret, so it is written with 0600
//! permissions (owner read/write only) on Unix.
//!
//! `load` never fails: a missing file, an unparseable document or an
//! absent node all read as "no token". Only `save`/`clear` surface
//! store-level I/O errors, and the session layer treats those as
//! best-effort where the contract requires it.

use chrono::Utc;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the state file inside the data directory.
pub const STATE_FILE: &str = "state.kdl";

/// Required permissions for state.kdl (Unix: 0600, owner read/write only).
#[cfg(unix)]
pub const STATE_FILE_MODE: u32 = 0o600;

const TOKEN_NODE: &str = "auth-token";
const SAVED_AT_NODE: &str = "token-saved-at";

/// Durable storage for a single bearer token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store backed by the default data directory
    /// (`$PM_DATA_DIR` or `~/.local/share/pilotage`).
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            path: crate::config::data_dir()?.join(STATE_FILE),
        })
    }

    /// Store backed by an explicit directory (tests, custom setups).
    pub fn with_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(STATE_FILE),
        }
    }

    /// Read the saved token, or `None` if nothing usable is stored.
    pub fn load(&self) -> Option<String> {
        let text = fs::read_to_string(&self.path).ok()?;
        let doc: KdlDocument = text.parse().ok()?;
        doc.get(TOKEN_NODE)?
            .entries()
            .first()?
            .value()
            .as_string()
            .map(String::from)
    }

    /// Durably persist `token`, replacing any previous value.
    pub fn save(&self, token: &str) -> io::Result<()> {
        let mut doc = self.read_doc().unwrap_or_else(KdlDocument::new);
        remove_nodes(&mut doc);

        let mut node = KdlNode::new(TOKEN_NODE);
        node.push(KdlEntry::new(KdlValue::String(token.to_string())));
        doc.nodes_mut().push(node);

        let mut saved_at = KdlNode::new(SAVED_AT_NODE);
        saved_at.push(KdlEntry::new(KdlValue::String(Utc::now().to_rfc3339())));
        doc.nodes_mut().push(saved_at);

        self.write_doc(&doc)
    }

    /// Remove any saved token. Succeeds when none was present.
    pub fn clear(&self) -> io::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        match self.read_doc() {
            Some(mut doc) => {
                remove_nodes(&mut doc);
                self.write_doc(&doc)
            }
            // Unparseable state file: drop it rather than leave a stale
            // token on disk.
            None => fs::remove_file(&self.path),
        }
    }

    fn read_doc(&self) -> Option<KdlDocument> {
        let text = fs::read_to_string(&self.path).ok()?;
        text.parse().ok()
    }

    fn write_doc(&self, doc: &KdlDocument) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, doc.to_string())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(STATE_FILE_MODE))?;
        }

        Ok(())
    }
}

fn remove_nodes(doc: &mut KdlDocument) {
    doc.nodes_mut().retain(|node| {
        let name = node.name().value();
        name != TOKEN_NODE && name != SAVED_AT_NODE
    });
}
