use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::ProcessingStatus;

/// Application-level constants
pub const APP_NAME: &str = "Paperfile";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "info,paperfile=debug"
}

/// Default application data directory: ~/Paperfile/
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Paperfile")
}

/// Default archive root for filed documents
pub fn default_archive_root() -> PathBuf {
    app_data_dir().join("archive")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A predefined tag: fires when any keyword appears in the text as a whole
/// word, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A canonical organization and the aliases that identify it in text.
/// Any alias appearing anywhere in a document resolves the issuer to the
/// canonical name with highest confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownIssuer {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// Engine configuration: rule tables are explicit data, loaded once and
/// compiled into regex tables at extractor construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Writable root the archive tree is built under.
    pub archive_root: PathBuf,
    /// User id recorded on audit entries.
    pub audit_user_id: String,
    /// Status the batch consumes.
    pub status_to_process: ProcessingStatus,
    /// Status set after a successful filing.
    pub status_after_filing: ProcessingStatus,
    pub tag_definitions: Vec<TagDefinition>,
    pub known_issuers: Vec<KnownIssuer>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive_root: default_archive_root(),
            audit_user_id: "tagger_engine".into(),
            status_to_process: ProcessingStatus::Summarized,
            status_after_filing: ProcessingStatus::Filed,
            tag_definitions: default_tag_definitions(),
            known_issuers: default_known_issuers(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn tag(name: &str, keywords: &[&str]) -> TagDefinition {
    TagDefinition {
        name: name.into(),
        keywords: keywords.iter().map(|k| (*k).into()).collect(),
    }
}

pub fn default_tag_definitions() -> Vec<TagDefinition> {
    vec![
        tag("urgent", &["urgent", "immediate attention", "asap", "emergency"]),
        tag(
            "confidential",
            &["confidential", "private", "sensitive", "do not distribute"],
        ),
        tag("important", &["important", "critical", "essential", "priority"]),
        tag(
            "follow_up",
            &["follow up", "follow-up", "requires response", "respond by"],
        ),
    ]
}

fn issuer(canonical: &str, aliases: &[&str]) -> KnownIssuer {
    KnownIssuer {
        canonical: canonical.into(),
        aliases: aliases.iter().map(|a| (*a).into()).collect(),
    }
}

/// Aliases are deliberately multi-word or distinctive strings: matching is
/// plain substring, so short aliases would fire inside unrelated words.
pub fn default_known_issuers() -> Vec<KnownIssuer> {
    vec![
        issuer(
            "Kaiser Permanente",
            &["kaiser permanente", "kaiser foundation"],
        ),
        issuer("Quest Diagnostics", &["quest diagnostics"]),
        issuer("LabCorp", &["labcorp", "laboratory corporation of america"]),
        issuer("Blue Cross Blue Shield", &["blue cross", "blue shield"]),
        issuer(
            "Internal Revenue Service",
            &["internal revenue service", "department of the treasury"],
        ),
        issuer(
            "Pacific Gas and Electric",
            &["pacific gas and electric", "pg&e"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_archive_root_under_home() {
        let root = default_archive_root();
        let home = dirs::home_dir().unwrap();
        assert!(root.starts_with(home));
        assert!(root.ends_with("Paperfile/archive"));
    }

    #[test]
    fn default_config_processes_summarized() {
        let config = EngineConfig::default();
        assert_eq!(config.status_to_process, ProcessingStatus::Summarized);
        assert_eq!(config.status_after_filing, ProcessingStatus::Filed);
        assert!(!config.tag_definitions.is_empty());
        assert!(!config.known_issuers.is_empty());
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"archive_root": "/tmp/archive", "audit_user_id": "batch_runner"}"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.archive_root, PathBuf::from("/tmp/archive"));
        assert_eq!(config.audit_user_id, "batch_runner");
        assert_eq!(config.status_to_process, ProcessingStatus::Summarized);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn status_round_trips_as_snake_case_in_config() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"status_to_process": "filing_error"}"#).unwrap();
        assert_eq!(config.status_to_process, ProcessingStatus::FilingError);
    }
}
