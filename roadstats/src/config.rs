//! Run configuration.
//!
//! Values are resolved in three layers: defaults, then environment
//! variables (a `.env` file is loaded by the binary before this runs),
//! then command-line flags applied by `main`.
//!
//! | Variable               | Field              |
//! |------------------------|--------------------|
//! | `ROADSTATS_DATABASE`   | `database`         |
//! | `ROADSTATS_TABLE`      | `table`            |
//! | `ROADSTATS_KEY_COLUMN` | `key_column`       |
//! | `ROADSTATS_OUTPUT`     | `output`           |
//! | `ROADSTATS_PARSE`      | `parse_policy`     |
//! | `ROADSTATS_DUPLICATES` | `duplicate_policy` |

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{StatsError, StatsResult};

/// Table read when nothing else is configured
pub const DEFAULT_TABLE: &str = "countrydata";

/// Country code column, expected first in the table
pub const DEFAULT_KEY_COLUMN: &str = "isocode";

/// Report file written when nothing else is configured
pub const DEFAULT_OUTPUT: &str = "road_data.json";

/// How class values are read from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// Exactly one finite number per class column; anything else fails the run.
    #[default]
    Strict,
    /// Whitespace-tokenize the class fields and keep whatever parses.
    /// Dropped fields are reported as degradations.
    Lenient,
}

impl FromStr for ParsePolicy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ParsePolicy::Strict),
            "lenient" => Ok(ParsePolicy::Lenient),
            _ => Err(StatsError::Config {
                key: "parse policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// What to do when a country code shows up more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep one entry at the first-seen position, holding the last-seen record.
    #[default]
    LastWins,
    /// Fail the run.
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-wins" | "last_wins" | "lastwins" => Ok(DuplicatePolicy::LastWins),
            "reject" => Ok(DuplicatePolicy::Reject),
            _ => Err(StatsError::Config {
                key: "duplicate policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Where the report goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// `-` means stdout, anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(raw))
        }
    }
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::File(PathBuf::from(DEFAULT_OUTPUT))
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => write!(f, "<stdout>"),
        }
    }
}

/// Which table to read and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// SQLite file holding the statistics
    pub database: Option<PathBuf>,

    /// Table with one row per country
    pub table: String,

    /// Country code column (must be the first column of `table`)
    pub key_column: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database: None,
            table: DEFAULT_TABLE.to_string(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

impl SourceConfig {
    /// The database path, or a usage error when none was given.
    pub fn require_database(&self) -> StatsResult<&Path> {
        match self.database.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(StatsError::Usage),
        }
    }
}

/// Full configuration of a report run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub source: SourceConfig,
    pub output: OutputTarget,
    pub parse_policy: ParsePolicy,
    pub duplicate_policy: DuplicatePolicy,
}

impl ReportConfig {
    /// Defaults overridden by `ROADSTATS_*` environment variables.
    pub fn from_env() -> StatsResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ReportConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> StatsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ROADSTATS_DATABASE") {
            config.source.database = Some(PathBuf::from(v));
        }
        if let Some(v) = get("ROADSTATS_TABLE") {
            config.source.table = v;
        }
        if let Some(v) = get("ROADSTATS_KEY_COLUMN") {
            config.source.key_column = v;
        }
        if let Some(v) = get("ROADSTATS_OUTPUT") {
            config.output = OutputTarget::parse(&v);
        }
        if let Some(v) = get("ROADSTATS_PARSE") {
            config.parse_policy = v.parse()?;
        }
        if let Some(v) = get("ROADSTATS_DUPLICATES") {
            config.duplicate_policy = v.parse()?;
        }

        Ok(config)
    }
}
