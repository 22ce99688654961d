use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info};

pub const CONFIG_PATH: &str = "/etc/argononeupd.conf";

const TIMEOUT_KEY: &str = "lidshutdownsecs";

/// Source of the lid-closed shutdown timeout. Queried again on every lid
/// closure, so edits take effect on the next closure without a restart.
/// A zero duration means the shutdown feature is disabled.
pub trait TimeoutSource {
    fn shutdown_timeout(&self) -> Duration;
}

pub struct ConfFile {
    path: PathBuf,
}

impl ConfFile {
    pub fn new() -> ConfFile {
        ConfFile::at(CONFIG_PATH)
    }

    pub fn at(path: impl Into<PathBuf>) -> ConfFile {
        ConfFile { path: path.into() }
    }
}

impl TimeoutSource for ConfFile {
    fn shutdown_timeout(&self) -> Duration {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "{} not present, shutdown timeout disabled",
                    self.path.display()
                );
                return Duration::ZERO;
            }
            Err(err) => {
                error!("error reading {}: {}", self.path.display(), err);
                return Duration::ZERO;
            }
        };

        parse_timeout(&contents)
    }
}

/// Scans line-oriented `key = value` text for the first `lidshutdownsecs`
/// entry. Blank lines and `#` comments are skipped; any malformed value
/// degrades to zero rather than propagating an error.
fn parse_timeout(contents: &str) -> Duration {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != TIMEOUT_KEY {
            continue;
        }

        return match value.trim().parse::<u64>() {
            Ok(secs) => {
                info!("shutdown timeout set to {} seconds", secs);
                Duration::from_secs(secs)
            }
            Err(err) => {
                error!("error parsing {}: {}", TIMEOUT_KEY, err);
                Duration::ZERO
            }
        };
    }

    debug!("no {} entry found, shutdown timeout disabled", TIMEOUT_KEY);
    Duration::ZERO
}
