//! Slate metadata fields.
//!
//! A [`FieldSet`] carries one optional value per [`FieldKey`]. Every key must
//! be present (a `None` value counts as present) before a slate can be
//! built; a key that was never set is reported as missing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use dailies_common::error::{DailiesError, DailiesResult};

/// Text shown for a field that is present but has no value.
pub const EMPTY_VALUE: &str = "-";

/// The fixed set of slate fields, in slate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    CompanyName,
    ProjectName,
    Lut,
    ShotName,
    FileName,
    Fps,
    FrameRange,
    FrameTotal,
    Handles,
    CompRes,
    Date,
    User,
    Description,
}

impl FieldKey {
    /// Every key, in the set's fixed order.
    pub const ALL: [FieldKey; 13] = [
        FieldKey::CompanyName,
        FieldKey::ProjectName,
        FieldKey::Lut,
        FieldKey::ShotName,
        FieldKey::FileName,
        FieldKey::Fps,
        FieldKey::FrameRange,
        FieldKey::FrameTotal,
        FieldKey::Handles,
        FieldKey::CompRes,
        FieldKey::Date,
        FieldKey::User,
        FieldKey::Description,
    ];

    /// Keys rendered as label/value rows under the headlines.
    pub const ROWS: [FieldKey; 11] = [
        FieldKey::Lut,
        FieldKey::ShotName,
        FieldKey::FileName,
        FieldKey::Fps,
        FieldKey::FrameRange,
        FieldKey::FrameTotal,
        FieldKey::Handles,
        FieldKey::CompRes,
        FieldKey::Date,
        FieldKey::User,
        FieldKey::Description,
    ];

    /// Mapping key used in field files and APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::CompanyName => "company_name",
            FieldKey::ProjectName => "project_name",
            FieldKey::Lut => "lut",
            FieldKey::ShotName => "shot_name",
            FieldKey::FileName => "file_name",
            FieldKey::Fps => "fps",
            FieldKey::FrameRange => "frame_range",
            FieldKey::FrameTotal => "frame_total",
            FieldKey::Handles => "handles",
            FieldKey::CompRes => "comp_res",
            FieldKey::Date => "date",
            FieldKey::User => "user",
            FieldKey::Description => "description",
        }
    }

    /// Caption drawn to the left of the value on the slate.
    pub fn caption(self) -> &'static str {
        match self {
            FieldKey::CompanyName => "Company:",
            FieldKey::ProjectName => "Project:",
            FieldKey::Lut => "LUT:",
            FieldKey::ShotName => "Shot name:",
            FieldKey::FileName => "File name:",
            FieldKey::Fps => "FPS:",
            FieldKey::FrameRange => "Frame range:",
            FieldKey::FrameTotal => "Frame total:",
            FieldKey::Handles => "Handles:",
            FieldKey::CompRes => "Comp resolution:",
            FieldKey::Date => "Date:",
            FieldKey::User => "User:",
            FieldKey::Description => "Description:",
        }
    }

    /// Parse a mapping key.
    pub fn parse(key: &str) -> Option<FieldKey> {
        FieldKey::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named metadata values populating the slate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    values: BTreeMap<FieldKey, Option<String>>,
}

impl FieldSet {
    /// An empty set. Every key is missing until set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with every key present and no values.
    pub fn blank() -> Self {
        Self {
            values: FieldKey::ALL.into_iter().map(|k| (k, None)).collect(),
        }
    }

    /// Build a set from a JSON object.
    ///
    /// Strings are taken as-is, numbers and booleans are stringified and
    /// `null` marks the key as present without a value. Unknown keys are
    /// ignored.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> DailiesResult<Self> {
        let mut fields = Self::new();
        for (name, value) in map {
            let Some(key) = FieldKey::parse(name) else {
                tracing::warn!(field = %name, "Ignoring unknown slate field");
                continue;
            };
            let value = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Bool(b) => Some(b.to_string()),
                other => {
                    return Err(DailiesError::config(format!(
                        "Slate field '{name}' must be a string, number, or null, got {other}"
                    )))
                }
            };
            fields.set(key, value);
        }
        Ok(fields)
    }

    /// Set (or replace) one field.
    pub fn set(&mut self, key: FieldKey, value: Option<impl Into<String>>) -> &mut Self {
        self.values.insert(key, value.map(Into::into));
        self
    }

    /// Set a field only when it has not been set yet.
    pub fn set_default(&mut self, key: FieldKey, value: Option<impl Into<String>>) -> &mut Self {
        self.values.entry(key).or_insert_with(|| value.map(Into::into));
        self
    }

    /// Remove a field entirely, making it missing.
    pub fn unset(&mut self, key: FieldKey) -> &mut Self {
        self.values.remove(&key);
        self
    }

    /// Whether the key has been set (possibly to `None`).
    pub fn contains(&self, key: FieldKey) -> bool {
        self.values.contains_key(&key)
    }

    /// The value of a field, failing when the key is missing.
    pub fn get(&self, key: FieldKey) -> DailiesResult<Option<&str>> {
        self.values
            .get(&key)
            .map(|v| v.as_deref())
            .ok_or_else(|| DailiesError::missing_key(key.as_str()))
    }

    /// The text to draw for a field. Empty and `None` values render as
    /// [`EMPTY_VALUE`].
    pub fn display_value(&self, key: FieldKey) -> DailiesResult<String> {
        Ok(match self.get(key)? {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => EMPTY_VALUE.to_string(),
        })
    }

    /// Check that every key is present, reporting the first missing one.
    pub fn validate(&self) -> DailiesResult<()> {
        match FieldKey::ALL.into_iter().find(|k| !self.contains(*k)) {
            Some(missing) => Err(DailiesError::missing_key(missing.as_str())),
            None => Ok(()),
        }
    }

    /// Keys that have not been set.
    pub fn missing(&self) -> Vec<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .filter(|k| !self.contains(*k))
            .collect()
    }

    /// The label/value rows in slate order.
    pub fn rows(&self) -> DailiesResult<Vec<(FieldKey, String)>> {
        FieldKey::ROWS
            .into_iter()
            .map(|k| self.display_value(k).map(|v| (k, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete() -> FieldSet {
        let mut fields = FieldSet::blank();
        fields
            .set(FieldKey::CompanyName, Some("Evil Eye Pictures"))
            .set(FieldKey::ShotName, Some("shot010"))
            .set(FieldKey::Fps, Some("24"));
        fields
    }

    #[test]
    fn test_blank_set_is_valid() {
        assert!(FieldSet::blank().validate().is_ok());
        assert_eq!(FieldSet::new().missing().len(), 13);
    }

    #[test]
    fn test_missing_key_is_reported_by_name() {
        let mut fields = complete();
        fields.unset(FieldKey::Handles);
        let err = fields.validate().unwrap_err();
        assert!(matches!(err, DailiesError::ConfigMissingKey { ref key } if key == "handles"));
        assert!(fields.rows().is_err());
    }

    #[test]
    fn test_null_and_empty_render_placeholder() {
        let mut fields = complete();
        fields.set(FieldKey::User, Some("   "));
        assert_eq!(fields.display_value(FieldKey::Lut).unwrap(), EMPTY_VALUE);
        assert_eq!(fields.display_value(FieldKey::User).unwrap(), EMPTY_VALUE);
        assert_eq!(fields.display_value(FieldKey::ShotName).unwrap(), "shot010");
    }

    #[test]
    fn test_from_json_map_stringifies_scalars() {
        let json = serde_json::json!({
            "shot_name": "shot010",
            "fps": 23.976,
            "handles": 8,
            "lut": null,
            "not_a_field": "ignored"
        });
        let fields = FieldSet::from_json_map(json.as_object().unwrap()).unwrap();
        assert_eq!(fields.get(FieldKey::Fps).unwrap(), Some("23.976"));
        assert_eq!(fields.get(FieldKey::Handles).unwrap(), Some("8"));
        assert_eq!(fields.get(FieldKey::Lut).unwrap(), None);
        assert!(fields.get(FieldKey::Date).is_err());
    }

    #[test]
    fn test_from_json_map_rejects_nested_values() {
        let json = serde_json::json!({ "description": ["a", "b"] });
        assert!(FieldSet::from_json_map(json.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_set_default_keeps_existing_value() {
        let mut fields = complete();
        fields.set_default(FieldKey::ShotName, Some("other"));
        fields.set_default(FieldKey::Date, Some("2026-10-17"));
        assert_eq!(fields.get(FieldKey::ShotName).unwrap(), Some("shot010"));
        assert_eq!(fields.get(FieldKey::Date).unwrap(), None);
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in FieldKey::ALL {
            assert_eq!(FieldKey::parse(key.as_str()), Some(key));
        }
    }

    proptest! {
        #[test]
        fn prop_rows_follow_key_order(
            values in proptest::collection::vec(proptest::option::of(".{0,24}"), 13)
        ) {
            let mut fields = FieldSet::new();
            for (key, value) in FieldKey::ALL.into_iter().zip(values) {
                fields.set(key, value);
            }
            let rows = fields.rows().unwrap();
            let keys: Vec<FieldKey> = rows.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(keys, FieldKey::ROWS.to_vec());
        }
    }
}
