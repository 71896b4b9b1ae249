use crate::grouper::{DEFAULT_LEET_CHARS, DEFAULT_PROGRESS_INTERVAL, Grouper};
use crate::mutator::{DEFAULT_MAX_CAP_PER_WORD, DEFAULT_MAX_LEET_PER_WORD, MutatorConfig};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct GrouperSettings {
    #[serde(default = "default_true")]
    pub leet: bool,
    #[serde(default = "default_leet_chars")]
    pub leet_chars: String,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

fn default_true() -> bool {
    true
}

fn default_leet_chars() -> String {
    String::from_utf8_lossy(DEFAULT_LEET_CHARS).into_owned()
}

fn default_progress_interval() -> usize {
    DEFAULT_PROGRESS_INTERVAL
}

impl Default for GrouperSettings {
    fn default() -> Self {
        Self {
            leet: true,
            leet_chars: default_leet_chars(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl GrouperSettings {
    pub fn build(&self) -> Grouper {
        Grouper::new()
            .with_leet(self.leet)
            .with_leet_chars(self.leet_chars.as_bytes())
            .with_progress_interval(self.progress_interval)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct MutatorSettings {
    #[serde(default)]
    pub leet: bool,
    #[serde(default)]
    pub cap: bool,
    #[serde(default)]
    pub capswap: bool,
    #[serde(default)]
    pub perm_depth: usize,
    #[serde(default = "default_max_leet")]
    pub max_leet_per_word: i64,
    #[serde(default = "default_max_cap")]
    pub max_cap_per_word: i64,
}

fn default_max_leet() -> i64 {
    DEFAULT_MAX_LEET_PER_WORD
}

fn default_max_cap() -> i64 {
    DEFAULT_MAX_CAP_PER_WORD
}

impl Default for MutatorSettings {
    fn default() -> Self {
        Self {
            leet: false,
            cap: false,
            capswap: false,
            perm_depth: 0,
            max_leet_per_word: default_max_leet(),
            max_cap_per_word: default_max_cap(),
        }
    }
}

impl MutatorSettings {
    /// Returns `true` if any stage would change the input.
    pub fn any_enabled(&self) -> bool {
        self.leet || self.cap || self.capswap || self.perm_depth > 1
    }

    pub fn to_config(&self) -> MutatorConfig {
        MutatorConfig {
            leet: self.leet,
            cap: self.cap,
            capswap: self.capswap,
            perm_depth: self.perm_depth,
            max_leet_per_word: self.max_leet_per_word,
            max_cap_per_word: self.max_cap_per_word,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// Maximum lines in each individual report.
    #[serde(default = "default_report_limit")]
    pub limit: usize,
}

pub fn default_report_limit() -> usize {
    50
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            limit: default_report_limit(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct StretcherConfig {
    #[serde(default)]
    pub grouper: GrouperSettings,
    #[serde(default)]
    pub mutator: MutatorSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

impl StretcherConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StretcherConfig::from_toml_str("").unwrap();
        assert_eq!(config, StretcherConfig::default());
        assert!(config.grouper.leet);
        assert_eq!(config.grouper.leet_chars, "013578@$");
        assert_eq!(config.mutator.max_leet_per_word, 64);
        assert_eq!(config.mutator.max_cap_per_word, 128);
        assert_eq!(config.report.limit, 50);
        assert!(!config.mutator.any_enabled());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = StretcherConfig::from_toml_str(
            r#"
            [grouper]
            leet-chars = "01@"

            [mutator]
            capswap = true
            max-cap-per-word = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.grouper.leet_chars, "01@");
        assert_eq!(config.grouper.progress_interval, 1000);
        assert!(config.mutator.capswap);
        assert!(config.mutator.any_enabled());
        let mutator = config.mutator.to_config();
        assert_eq!(mutator.max_cap_per_word, 16);
        assert_eq!(mutator.max_leet_per_word, 64);

        let grouper = config.grouper.build();
        assert!(grouper.is_leet_char(b'@'));
        assert!(!grouper.is_leet_char(b'$'));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(StretcherConfig::from_toml_str("[report]\nlines = 5\n").is_err());
        assert!(StretcherConfig::from_toml_str("[hashcat]\n").is_err());
    }

    #[test]
    fn load_from_file_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[report]\nlimit = 7\n").unwrap();
        let config = StretcherConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.report.limit, 7);

        let missing = file.path().with_extension("missing");
        let err = StretcherConfig::load_from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
