//! Configuration for the `pm` CLI.
//!
//! Preferences live in `config.kdl` under the data directory:
//!
//! ```kdl
//! api-url "https://pilotage.example.com"
//! output-format "human"  // or "json"
//! ```
//!
//! Precedence for the backend URL: CLI flag (`--api-url`, which clap also
//! fills from `PM_API_URL`) > `config.kdl` > the local default. The data
//! directory itself can be relocated with `PM_DATA_DIR`, which is how
//! tests isolate themselves.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default backend host when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Environment variable overriding the backend host.
pub const API_URL_ENV: &str = "PM_API_URL";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PM_DATA_DIR";

/// File name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.kdl";

/// Resolve the data directory: `$PM_DATA_DIR`, or the XDG data dir
/// (`~/.local/share/pilotage`). Created if missing.
pub fn data_dir() -> io::Result<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or_else(|| io::Error::other("no data directory available"))?
            .join("pilotage"),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in `config.kdl`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PilotageConfig {
    /// Backend host, e.g. `http://localhost:8001`.
    pub api_url: Option<String>,

    /// Default output format for CLI commands.
    pub output_format: Option<OutputFormat>,
}

impl PilotageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from a KDL document. Unknown or malformed nodes are
    /// ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(node) = doc.get("api-url") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.api_url = Some(s.trim_end_matches('/').to_string());
                }
            }
        }

        if let Some(node) = doc.get("output-format") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.output_format = OutputFormat::parse(s);
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.api_url {
            let mut node = KdlNode::new("api-url");
            node.push(KdlEntry::new(KdlValue::String(url.clone())));
            doc.nodes_mut().push(node);
        }

        if let Some(format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Load config from `dir/config.kdl`. Missing or unparseable files
    /// read as an empty config.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => match text.parse::<KdlDocument>() {
                Ok(doc) => Self::from_kdl(&doc),
                Err(_) => Self::new(),
            },
            Err(_) => Self::new(),
        }
    }

    /// Write config to `dir/config.kdl`.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(CONFIG_FILE), self.to_kdl().to_string())
    }

    /// Resolve the backend URL. `cli_value` carries both the `--api-url`
    /// flag and the `PM_API_URL` env var (clap resolves that precedence).
    pub fn resolve_api_url(&self, cli_value: Option<&str>) -> String {
        if let Some(url) = cli_value {
            return url.trim_end_matches('/').to_string();
        }
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_from_kdl_full() {
        let kdl = r#"
            api-url "https://pilotage.example.com"
            output-format "human"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = PilotageConfig::from_kdl(&doc);

        assert_eq!(
            config.api_url,
            Some("https://pilotage.example.com".to_string())
        );
        assert_eq!(config.output_format, Some(OutputFormat::Human));
    }

    #[test]
    fn test_from_kdl_empty() {
        let config = PilotageConfig::from_kdl(&KdlDocument::new());
        assert_eq!(config, PilotageConfig::default());
    }

    #[test]
    fn test_kdl_round_trip() {
        let config = PilotageConfig {
            api_url: Some("http://localhost:9000".to_string()),
            output_format: Some(OutputFormat::Json),
        };
        let parsed = PilotageConfig::from_kdl(&config.to_kdl());
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(PilotageConfig::load(dir.path()), PilotageConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let config = PilotageConfig {
            api_url: Some("http://localhost:9000".to_string()),
            output_format: None,
        };
        config.save(dir.path()).unwrap();
        assert_eq!(PilotageConfig::load(dir.path()), config);
    }

    #[test]
    fn test_resolve_api_url_precedence() {
        let config = PilotageConfig {
            api_url: Some("http://from-file".to_string()),
            output_format: None,
        };
        assert_eq!(config.resolve_api_url(Some("http://from-flag/")), "http://from-flag");
        assert_eq!(config.resolve_api_url(None), "http://from-file");
        assert_eq!(
            PilotageConfig::default().resolve_api_url(None),
            DEFAULT_API_URL
        );
    }
}
