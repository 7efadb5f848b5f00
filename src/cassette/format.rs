//! On-disk cassette layout.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded port call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name (`issues`, `id_gen`).
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments, as JSON.
    pub input: serde_json::Value,
    /// Result, as JSON. Fallible calls use `{"ok": ..}` or `{"err": ".."}`.
    pub output: serde_json::Value,
}

/// A named, ordered set of interactions stored as YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Git commit of the recording checkout.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads and parses a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid cassette.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = std::env::temp_dir().join("failwatch_cassette_format_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.cassette.yaml");
        std::fs::write(&path, "interactions: [").unwrap();

        let err = Cassette::load(&path).unwrap_err();
        assert!(err.contains("Failed to parse cassette file"));
        assert!(err.contains("broken.cassette.yaml"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_reads_written_cassette() {
        let dir = std::env::temp_dir().join("failwatch_cassette_format_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("issues.cassette.yaml");
        let cassette = Cassette {
            name: "issues".into(),
            recorded_at: Utc::now(),
            commit: "abc123".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "issues".into(),
                method: "list_issues".into(),
                input: json!({"label": "flaky"}),
                output: json!({"ok": []}),
            }],
        };
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        assert_eq!(Cassette::load(&path).unwrap(), cassette);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
