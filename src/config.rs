// Configuration file handling: a small JSON document under the user's
// config directory holding the qBittorrent host and credentials plus a
// few local preferences.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "magnet2qb";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encode config: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Incomplete(&'static str),
}

/// User-adjustable settings. Keys missing from the file keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub save_dir: String,
    pub log_level: String,
    pub app_name: String,
    pub qb_username: String,
    pub qb_password: String,
    pub qb_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_home(dirs::home_dir().as_deref())
    }
}

impl Config {
    fn with_home(home: Option<&Path>) -> Self {
        Config {
            save_dir: default_save_dir(home),
            log_level: "info".into(),
            app_name: APP_NAME.into(),
            qb_username: String::new(),
            qb_password: String::new(),
            qb_host: String::new(),
            log_file: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read the config at `path`. A missing file is not an error: defaults
    /// are returned and the flag is `true`.
    pub fn load(path: &Path) -> Result<(Config, bool), ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Config::default(), true)),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let cfg = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((cfg, false))
    }

    /// Write the config as pretty JSON, creating parent directories. The
    /// file holds a password, so on unix it is only readable by the owner.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let mut file = open_private(path).map_err(write_err)?;
        file.write_all(data.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;
        Ok(())
    }

    /// Check that everything needed to reach qBittorrent is filled in.
    pub fn validate_qb(&self) -> Result<(), ConfigError> {
        if self.qb_host.is_empty() {
            return Err(ConfigError::Incomplete(
                "qbittorrent host is empty; set qbHost in config",
            ));
        }
        if self.qb_username.is_empty() {
            return Err(ConfigError::Incomplete(
                "qbittorrent username is empty; set qbUsername in config",
            ));
        }
        if self.qb_password.is_empty() {
            return Err(ConfigError::Incomplete(
                "qbittorrent password is empty; set qbPassword in config",
            ));
        }
        Ok(())
    }

    pub fn needs_qb_setup(&self) -> bool {
        self.qb_host.is_empty() || self.qb_username.is_empty() || self.qb_password.is_empty()
    }

    /// `None` when the timeout is set to 0, meaning "no limit".
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

/// Platform config location for this machine.
pub fn default_config_file() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    let appdata = std::env::var_os("APPDATA").map(PathBuf::from);
    default_config_path(std::env::consts::OS, &home, appdata.as_deref())
}

/// `%APPDATA%\magnet2qb\config.json` on Windows (falling back to the
/// roaming folder under `home`), `~/.config/magnet2qb/config.json`
/// everywhere else.
pub fn default_config_path(os: &str, home: &Path, appdata: Option<&Path>) -> PathBuf {
    if os == "windows" {
        let base = match appdata {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => home.join("AppData").join("Roaming"),
        };
        return base.join(APP_NAME).join("config.json");
    }
    home.join(".config").join(APP_NAME).join("config.json")
}

fn default_save_dir(home: Option<&Path>) -> String {
    match home {
        Some(home) if !home.as_os_str().is_empty() => home
            .join("Downloads")
            .join(APP_NAME)
            .to_string_lossy()
            .into_owned(),
        _ => format!("{APP_NAME}-downloads"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Config {
        Config {
            qb_host: "http://h".into(),
            qb_username: "u".into(),
            qb_password: "p".into(),
            ..Config::with_home(Some(Path::new("/home/alice")))
        }
    }

    #[test]
    fn default_paths_per_platform() {
        let cases = [
            (
                "linux",
                "/home/alice",
                None,
                Path::new("/home/alice/.config/magnet2qb/config.json").to_path_buf(),
            ),
            (
                "windows",
                "",
                Some(r"C:\Users\alice\AppData\Roaming"),
                Path::new(r"C:\Users\alice\AppData\Roaming")
                    .join("magnet2qb")
                    .join("config.json"),
            ),
            (
                "windows",
                r"C:\Users\alice",
                None,
                Path::new(r"C:\Users\alice")
                    .join("AppData")
                    .join("Roaming")
                    .join("magnet2qb")
                    .join("config.json"),
            ),
        ];
        for (os, home, appdata, want) in cases {
            let got = default_config_path(os, Path::new(home), appdata.map(Path::new));
            assert_eq!(got, want, "os={os} home={home} appdata={appdata:?}");
        }
    }

    #[test]
    fn save_dir_without_home() {
        assert_eq!(default_save_dir(None), "magnet2qb-downloads");
        let cfg = Config::with_home(Some(Path::new("/home/alice")));
        assert_eq!(
            PathBuf::from(cfg.save_dir),
            Path::new("/home/alice").join("Downloads").join("magnet2qb")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, used_defaults) = Config::load(&dir.path().join("config.json")).unwrap();
        assert!(used_defaults);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.needs_qb_setup());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = complete();

        cfg.save(&path).unwrap();
        let (loaded, used_defaults) = Config::load(&path).unwrap();
        assert!(!used_defaults);
        assert_eq!(loaded, cfg);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"qbHost": "http://localhost:8080", "logLevel": "debug"}"#).unwrap();

        let (cfg, _) = Config::load(&path).unwrap();
        assert_eq!(cfg.qb_host, "http://localhost:8080");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.app_name, "magnet2qb");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn validation_names_the_missing_field() {
        let cases = [
            (Config { qb_host: String::new(), ..complete() }, Some("qbittorrent host is empty")),
            (Config { qb_username: String::new(), ..complete() }, Some("qbittorrent username is empty")),
            (Config { qb_password: String::new(), ..complete() }, Some("qbittorrent password is empty")),
            (complete(), None),
        ];
        for (cfg, want) in cases {
            match (cfg.validate_qb(), want) {
                (Ok(()), None) => assert!(!cfg.needs_qb_setup()),
                (Err(err), Some(want)) => {
                    assert!(err.to_string().contains(want), "{err}");
                    assert!(cfg.needs_qb_setup());
                }
                (got, want) => panic!("got {got:?}, want {want:?}"),
            }
        }
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let cfg = Config { request_timeout_secs: 0, ..complete() };
        assert_eq!(cfg.request_timeout(), None);
    }
}
