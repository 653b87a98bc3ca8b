//! Small persisted key→value preference store backed by a JSON file.
//! A malformed file or value is logged and replaced by defaults; preference
//! loading never fails and never blocks startup.

use crate::log_debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// Persisted key for the configurable key bindings.
pub const KEY_MAPPINGS_KEY: &str = "pupil-key-mappings";
/// Persisted key for the radial-keyboard-enabled flag.
pub const RADIAL_ENABLED_KEY: &str = "pupil-radial-enabled";

pub struct PreferenceStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl PreferenceStore {
    /// Load the store from `path`. A missing or unparseable file yields an
    /// empty store (with a logged warning), never an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    log_debug(&format!(
                        "prefs: discarding malformed store {}: {err}",
                        path.display()
                    ));
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    /// Read a value, falling back to `default` on a missing key or a value
    /// that no longer deserializes (logged as a warning).
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.values.get(key) else {
            return default;
        };
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                log_debug(&format!("prefs: malformed value for '{key}': {err}"));
                default
            }
        }
    }

    /// Serialize and persist a value synchronously. A write failure is logged
    /// and otherwise swallowed; the in-memory value is kept either way.
    pub fn write<T: Serialize>(&mut self, key: &str, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                log_debug(&format!("prefs: failed to encode '{key}': {err}"));
                return;
            }
        };
        self.values.insert(key.to_string(), encoded);
        self.persist();
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string_pretty(&self.values) {
            Ok(encoded) => encoded,
            Err(err) => {
                log_debug(&format!("prefs: failed to encode store: {err}"));
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, encoded) {
            log_debug(&format!(
                "prefs: failed to persist {}: {err}",
                self.path.display()
            ));
        }
    }
}

/// The key that commits whatever a scan loop currently highlights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub code: String,
    pub label: String,
}

/// The pointer button that opens the radial keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseBinding {
    pub button: u8,
    pub label: String,
}

/// User-configurable bindings, persisted as one JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMappings {
    pub highlight_sequence: KeyBinding,
    pub radial_toggle: MouseBinding,
}

impl Default for KeyMappings {
    fn default() -> Self {
        Self {
            highlight_sequence: KeyBinding {
                key: " ".into(),
                code: "Space".into(),
                label: "Space".into(),
            },
            radial_toggle: MouseBinding {
                button: 1,
                label: "Middle Click".into(),
            },
        }
    }
}

/// Persisted form of `KeyMappings` where either field may be absent, so a
/// partially-saved mapping never loses the other binding.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialKeyMappings {
    highlight_sequence: Option<KeyBinding>,
    radial_toggle: Option<MouseBinding>,
}

/// Load the key mappings, merging whatever was persisted field-by-field over
/// the defaults.
pub fn load_key_mappings(store: &PreferenceStore) -> KeyMappings {
    let partial = store.read(KEY_MAPPINGS_KEY, PartialKeyMappings::default());
    let defaults = KeyMappings::default();
    KeyMappings {
        highlight_sequence: partial
            .highlight_sequence
            .unwrap_or(defaults.highlight_sequence),
        radial_toggle: partial.radial_toggle.unwrap_or(defaults.radial_toggle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        env::temp_dir().join(format!("pupil_prefs_{tag}_{unique}.json"))
    }

    #[test]
    fn read_returns_default_for_missing_key() {
        let store = PreferenceStore::open(temp_store_path("missing"));
        assert!(!store.read(RADIAL_ENABLED_KEY, false));
        assert!(store.read(RADIAL_ENABLED_KEY, true));
    }

    #[test]
    fn write_then_read_round_trips_through_the_file() {
        let path = temp_store_path("roundtrip");
        {
            let mut store = PreferenceStore::open(&path);
            store.write(RADIAL_ENABLED_KEY, &true);
        }
        let reloaded = PreferenceStore::open(&path);
        assert!(reloaded.read(RADIAL_ENABLED_KEY, false));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_store_path("malformed");
        fs::write(&path, "{not json").unwrap();
        let store = PreferenceStore::open(&path);
        assert_eq!(load_key_mappings(&store), KeyMappings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let path = temp_store_path("badvalue");
        fs::write(&path, format!("{{\"{KEY_MAPPINGS_KEY}\": 42}}")).unwrap();
        let store = PreferenceStore::open(&path);
        assert_eq!(load_key_mappings(&store), KeyMappings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_mapping_merges_over_defaults() {
        let path = temp_store_path("partial");
        let mut store = PreferenceStore::open(&path);
        store.write(
            KEY_MAPPINGS_KEY,
            &serde_json::json!({
                "highlightSequence": {"key": "Enter", "code": "Enter", "label": "x"}
            }),
        );

        let mappings = load_key_mappings(&store);
        assert_eq!(mappings.highlight_sequence.key, "Enter");
        assert_eq!(mappings.highlight_sequence.code, "Enter");
        assert_eq!(mappings.highlight_sequence.label, "x");
        assert_eq!(
            mappings.radial_toggle,
            KeyMappings::default().radial_toggle,
            "untouched field must keep its default"
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn full_mapping_persists_both_fields() {
        let path = temp_store_path("full");
        let custom = KeyMappings {
            highlight_sequence: KeyBinding {
                key: "a".into(),
                code: "KeyA".into(),
                label: "A".into(),
            },
            radial_toggle: MouseBinding {
                button: 2,
                label: "Right Click".into(),
            },
        };
        {
            let mut store = PreferenceStore::open(&path);
            store.write(KEY_MAPPINGS_KEY, &custom);
        }
        let reloaded = PreferenceStore::open(&path);
        assert_eq!(load_key_mappings(&reloaded), custom);
        let _ = fs::remove_file(&path);
    }
}
