use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::clean::DateOrder;

/// Runtime configuration for a loader run.
///
/// Values come from an optional `csvloader` config file in the working
/// directory, overlaid by environment variables prefixed with `CSVLOADER__`
/// (e.g. `CSVLOADER__CSV_DIR`, `CSVLOADER__DB__HOST`). Everything is
/// defaulted so an operator only needs to set what differs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for `*.csv` input files.
    pub csv_dir: PathBuf,
    /// Directory scanned for `*.sql` schema files.
    pub sql_dir: PathBuf,
    /// Column normalized to ISO dates by the cleaning pipeline.
    pub date_column: String,
    /// Ordering policy for ambiguous dates.
    pub date_order: DateOrder,
    /// Optional key columns for deduplication; whole rows when unset.
    pub dedupe_keys: Option<Vec<String>>,
    pub db: DbSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("."),
            sql_dir: PathBuf::from("."),
            date_column: "business_date".to_string(),
            date_order: DateOrder::MonthFirst,
            dedupe_keys: None,
            db: DbSettings::default(),
        }
    }
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "csvloader".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub fn load() -> Result<Settings, SettingsError> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("csvloader").required(false))
        .add_source(config::Environment::with_prefix("CSVLOADER").separator("__"))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_baseline() {
        let s = Settings::default();
        assert_eq!(s.csv_dir, PathBuf::from("."));
        assert_eq!(s.sql_dir, PathBuf::from("."));
        assert_eq!(s.date_column, "business_date");
        assert_eq!(s.date_order, DateOrder::MonthFirst);
        assert_eq!(s.db.port, 3306);
    }

    #[test]
    fn env_overlay_wins_over_defaults() {
        let orig = std::env::var_os("CSVLOADER__DB__DATABASE");
        std::env::set_var("CSVLOADER__DB__DATABASE", "salesdb");

        let s = load().expect("load settings");
        assert_eq!(s.db.database, "salesdb");

        match orig {
            Some(v) => std::env::set_var("CSVLOADER__DB__DATABASE", v),
            None => std::env::remove_var("CSVLOADER__DB__DATABASE"),
        }
    }
}
