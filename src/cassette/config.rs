//! Per-port cassette selection for replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. A port without a path panics if it is
/// called during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Cassette for the issues port.
    pub issues: Option<PathBuf>,
    /// Cassette for the ID generator port.
    pub id_gen: Option<PathBuf>,
}

/// Loaded replayers, one per configured port.
pub struct PortReplayers {
    /// Replayer for the issues port.
    pub issues: Option<CassetteReplayer>,
    /// Replayer for the ID generator port.
    pub id_gen: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Config pointing every port at the per-port files a
    /// [`RecordingSession`](super::session::RecordingSession) writes into `dir`.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        Self {
            issues: Some(dir.join("issues.cassette.yaml")),
            id_gen: Some(dir.join("id_gen.cassette.yaml")),
        }
    }

    /// Load every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Path| Cassette::load(path).map(|c| CassetteReplayer::new(&c));
        Ok(PortReplayers {
            issues: self.issues.as_deref().map(load).transpose()?,
            id_gen: self.id_gen.as_deref().map(load).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[test]
    fn loads_only_configured_ports() {
        let dir = std::env::temp_dir().join("failwatch_cassette_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let issues_path = dir.join("issues.cassette.yaml");
        let mut recorder = CassetteRecorder::new(&issues_path, "issues", "abc");
        recorder.record("issues", "list_issues", json!({}), json!({"ok": []}));
        recorder.finish().unwrap();

        let config = CassetteConfig { issues: Some(issues_path), ..CassetteConfig::default() };
        let mut replayers = config.load_all().unwrap();

        assert!(replayers.id_gen.is_none());
        let issues = replayers.issues.as_mut().unwrap();
        assert_eq!(issues.next_interaction("issues", "list_issues").output, json!({"ok": []}));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_error() {
        let config = CassetteConfig {
            id_gen: Some(PathBuf::from("/nonexistent/failwatch/id_gen.cassette.yaml")),
            ..CassetteConfig::default()
        };
        assert!(config.load_all().is_err());
    }

    #[test]
    fn session_dir_layout() {
        let config = CassetteConfig::from_session_dir(Path::new("/tmp/rec"));
        assert_eq!(config.issues.unwrap(), PathBuf::from("/tmp/rec/issues.cassette.yaml"));
        assert_eq!(config.id_gen.unwrap(), PathBuf::from("/tmp/rec/id_gen.cassette.yaml"));
    }
}
