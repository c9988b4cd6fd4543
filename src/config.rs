// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// File picked up from the working directory by [`Config::discover`].
pub const CONFIG_FILE: &str = "zonescrape.yaml";

/// Placeholder substituted with the zero-padded prefix in `url_template`.
pub const PREFIX_PLACEHOLDER: &str = "{post_code_prefix}";

const MIN_PREFIX: u16 = 1;
const MAX_PREFIX: u16 = 999;

/// Pipeline configuration: where files live, where they come from, and
/// which database receives them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw per-prefix files written by the fetcher.
    pub scrape_dir: PathBuf,

    /// Flattened files; `<scrape_dir>/parsed` when unset.
    pub parsed_dir: Option<PathBuf>,

    /// Download location, with `{post_code_prefix}` standing in for the prefix.
    pub url_template: String,

    /// First prefix to fetch (inclusive).
    pub first_prefix: u16,

    /// Last prefix to fetch (inclusive).
    pub last_prefix: u16,

    pub database: DatabaseConfig,
}

/// Connection descriptor for the relational store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scrape_dir: PathBuf::from("scraped_zone_files"),
            parsed_dir: None,
            url_template:
                "https://www.ups.com/media/us/currentrates/zone-csv/{post_code_prefix}.xls"
                    .to_string(),
            first_prefix: MIN_PREFIX,
            last_prefix: MAX_PREFIX,
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("zones.db"),
        }
    }
}

impl Config {
    /// Read and validate a YAML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("validating config {:?}", path))?;
        debug!(?config, "loaded config");
        Ok(config)
    }

    /// Load `zonescrape.yaml` from the working directory, or fall back to defaults.
    pub fn discover() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            info!(path = %path.display(), "using config file");
            Self::load(path)
        } else {
            debug!("no {} found, using defaults", CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_prefix < MIN_PREFIX || self.last_prefix > MAX_PREFIX {
            bail!(
                "prefix range {}..={} must lie within {}..={}",
                self.first_prefix,
                self.last_prefix,
                MIN_PREFIX,
                MAX_PREFIX
            );
        }
        if self.first_prefix > self.last_prefix {
            bail!(
                "first_prefix {} is greater than last_prefix {}",
                self.first_prefix,
                self.last_prefix
            );
        }
        if !self.url_template.contains(PREFIX_PLACEHOLDER) {
            bail!(
                "url_template {:?} has no {} placeholder",
                self.url_template,
                PREFIX_PLACEHOLDER
            );
        }
        Ok(())
    }

    pub fn parsed_dir(&self) -> PathBuf {
        self.parsed_dir
            .clone()
            .unwrap_or_else(|| self.scrape_dir.join("parsed"))
    }

    pub fn prefixes(&self) -> RangeInclusive<u16> {
        self.first_prefix..=self.last_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.prefixes(), 1..=999);
        assert_eq!(
            config.parsed_dir(),
            PathBuf::from("scraped_zone_files").join("parsed")
        );
        assert_eq!(config.database.path, PathBuf::from("zones.db"));
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_yaml() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "scrape_dir: /data/raw")?;
        writeln!(tmp, "first_prefix: 100")?;
        writeln!(tmp, "last_prefix: 105")?;
        writeln!(tmp, "database:")?;
        writeln!(tmp, "  path: /data/zones.sqlite")?;

        let config = Config::load(tmp.path())?;
        assert_eq!(config.scrape_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.parsed_dir(), PathBuf::from("/data/raw/parsed"));
        assert_eq!(config.prefixes().count(), 6);
        assert_eq!(config.database.path, PathBuf::from("/data/zones.sqlite"));
        assert!(config.url_template.contains(PREFIX_PLACEHOLDER));
        Ok(())
    }

    #[test]
    fn test_explicit_parsed_dir_wins() {
        let config = Config {
            parsed_dir: Some(PathBuf::from("elsewhere")),
            ..Default::default()
        };
        assert_eq!(config.parsed_dir(), PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let zero = Config {
            first_prefix: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let inverted = Config {
            first_prefix: 500,
            last_prefix: 400,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let too_high = Config {
            last_prefix: 1000,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_rejects_template_without_placeholder() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "url_template: https://example.com/fixed.xls")?;
        let err = Config::load(tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("placeholder"));
        Ok(())
    }
}
