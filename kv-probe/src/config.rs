use crate::{ProbeErrorKind, Result};
use failure::ResultExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Where the probe finds its store.
///
/// Missing fields fall back to the defaults, so a config file only needs to
/// name what differs from a local store on the standard port.
///
/// ```
/// use kv_probe::ProbeConfig;
///
/// let config = ProbeConfig::default();
/// assert_eq!("127.0.0.1:6379", config.addr());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// host name or ip address of the store
    pub host: String,
    /// tcp port of the store
    pub port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 6379,
        }
    }
}

impl ProbeConfig {
    /// load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).context(ProbeErrorKind::ConfigError)?;
        let config = serde_json::from_reader(BufReader::new(file))
            .context(ProbeErrorKind::ConfigError)?;
        Ok(config)
    }

    /// apply command line overrides on top of the loaded values
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// "host:port" string accepted by `KvClient::connect`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "port": 7000 }}"#).unwrap();

        let config = ProbeConfig::load(file.path()).unwrap();
        assert_eq!("127.0.0.1", config.host);
        assert_eq!(7000, config.port);
    }

    #[test]
    fn overrides_win_over_file() {
        let config = ProbeConfig::default().with_overrides(Some("store.local".to_owned()), None);
        assert_eq!("store.local:6379", config.addr());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "port = 7000").unwrap();

        let err = ProbeConfig::load(file.path()).unwrap_err();
        assert_eq!(ProbeErrorKind::ConfigError, err.kind());
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ProbeConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(ProbeErrorKind::ConfigError, err.kind());
    }
}
