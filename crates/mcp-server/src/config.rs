//! Process-wide configuration, read from the environment once at startup.

use crate::sandbox::RootSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_JMP_TIMEOUT_SEC: u64 = 60;
pub const DEFAULT_MAX_PREVIEW_ROWS: usize = 1000;
const TEMP_DIR_NAME: &str = "jmp_readonly_mcp";

/// What happens to a run directory once its outcome is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunRetention {
    /// Leave every run directory on disk for post-hoc debugging.
    #[default]
    Keep,
    /// Delete directories of successful runs, keep failures.
    KeepFailed,
    /// Delete every run directory.
    Discard,
}

impl RunRetention {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "keep" | "all" => Some(Self::Keep),
            "failed" | "keep_failed" => Some(Self::KeepFailed),
            "none" | "discard" => Some(Self::Discard),
            _ => None,
        }
    }

    pub fn keeps(self, succeeded: bool) -> bool {
        match self {
            Self::Keep => true,
            Self::KeepFailed => !succeeded,
            Self::Discard => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JmpConfig {
    pub exe_path: Option<PathBuf>,
    pub timeout: Duration,
    pub temp_root: PathBuf,
    /// Job template override; the bundled template is used when unset.
    pub template_path: Option<PathBuf>,
    pub retention: RunRetention,
}

impl Default for JmpConfig {
    fn default() -> Self {
        Self {
            exe_path: None,
            timeout: Duration::from_secs(DEFAULT_JMP_TIMEOUT_SEC),
            temp_root: default_temp_root(),
            template_path: None,
            retention: RunRetention::Keep,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub roots: RootSet,
    pub jmp: JmpConfig,
    pub max_preview_rows: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            roots: RootSet::default(),
            jmp: JmpConfig::default(),
            max_preview_rows: DEFAULT_MAX_PREVIEW_ROWS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let roots = RootSet::from_delimited(&value("DATA_ROOTS").unwrap_or_default());

        let timeout_sec = value("JMP_TIMEOUT_SEC")
            .and_then(|raw| parse_or_warn::<u64>("JMP_TIMEOUT_SEC", &raw))
            .unwrap_or(DEFAULT_JMP_TIMEOUT_SEC)
            .max(1);

        let max_preview_rows = value("MAX_PREVIEW_ROWS")
            .and_then(|raw| parse_or_warn::<i64>("MAX_PREVIEW_ROWS", &raw))
            .map(|n| n.max(1) as usize)
            .unwrap_or(DEFAULT_MAX_PREVIEW_ROWS);

        let retention = match value("JMP_RUN_RETENTION") {
            Some(raw) => RunRetention::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown JMP_RUN_RETENTION '{raw}', falling back to 'keep'");
                RunRetention::Keep
            }),
            None => RunRetention::Keep,
        };

        Self {
            roots,
            jmp: JmpConfig {
                exe_path: value("JMP_EXE_PATH").map(PathBuf::from),
                timeout: Duration::from_secs(timeout_sec),
                temp_root: value("TEMP_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_temp_root),
                template_path: value("JMP_TEMPLATE_PATH").map(PathBuf::from),
                retention,
            },
            max_preview_rows,
        }
    }
}

fn default_temp_root() -> PathBuf {
    env::temp_dir().join(TEMP_DIR_NAME)
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {key}='{raw}'; using the default");
            None
        }
    }
}
