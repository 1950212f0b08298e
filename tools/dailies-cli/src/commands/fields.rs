//! Slate field flags shared by `slate` and `mov`.

use std::path::{Path, PathBuf};

use clap::Args;

use dailies_model::fields::{FieldKey, FieldSet};
use dailies_model::sequence::SequenceDescriptor;

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// JSON file with slate fields (flags below override it)
    #[arg(long = "fields", value_name = "FILE")]
    pub fields_file: Option<PathBuf>,

    #[arg(long)]
    pub company_name: Option<String>,

    #[arg(long)]
    pub project_name: Option<String>,

    #[arg(long)]
    pub lut: Option<String>,

    /// Defaults to the sequence name
    #[arg(long)]
    pub shot_name: Option<String>,

    #[arg(long)]
    pub fps: Option<String>,

    #[arg(long)]
    pub handles: Option<String>,

    #[arg(long)]
    pub comp_res: Option<String>,

    /// Defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Defaults to the current user
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

impl FieldArgs {
    /// Build a complete field set: the JSON file first, then flags, then
    /// values derived from the sequence and environment. Anything still
    /// unset is left blank.
    pub fn to_field_set(&self, seq: &SequenceDescriptor) -> anyhow::Result<FieldSet> {
        let mut fields = match &self.fields_file {
            Some(path) => load_fields_file(path)?,
            None => FieldSet::new(),
        };

        let flags = [
            (FieldKey::CompanyName, &self.company_name),
            (FieldKey::ProjectName, &self.project_name),
            (FieldKey::Lut, &self.lut),
            (FieldKey::ShotName, &self.shot_name),
            (FieldKey::Fps, &self.fps),
            (FieldKey::Handles, &self.handles),
            (FieldKey::CompRes, &self.comp_res),
            (FieldKey::Date, &self.date),
            (FieldKey::User, &self.user),
            (FieldKey::Description, &self.description),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                fields.set(key, Some(value.as_str()));
            }
        }

        fields
            .set_default(FieldKey::ShotName, Some(seq.base_name()))
            .set_default(FieldKey::FileName, Some(seq.file_name()))
            .set_default(FieldKey::FrameRange, Some(seq.frame_range()))
            .set_default(FieldKey::FrameTotal, Some(seq.frame_count().to_string()))
            .set_default(
                FieldKey::Date,
                Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
            )
            .set_default(FieldKey::User, current_user());
        for key in FieldKey::ALL {
            fields.set_default(key, None::<String>);
        }
        Ok(fields)
    }
}

fn load_fields_file(path: &Path) -> anyhow::Result<FieldSet> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
    let map = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("{} must contain a JSON object", path.display()))?;
    Ok(FieldSet::from_json_map(map)?)
}

fn current_user() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailies_model::sequence::resolve;

    fn sequence(dir: &std::path::Path) -> SequenceDescriptor {
        for frame in 1001..=1024 {
            std::fs::write(dir.join(format!("shot010.{frame:04}.exr")), b"").unwrap();
        }
        resolve(dir.join("shot010.%04d.exr").to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_come_from_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence(dir.path());
        let fields = FieldArgs::default().to_field_set(&seq).unwrap();

        assert!(fields.validate().is_ok());
        assert_eq!(fields.get(FieldKey::ShotName).unwrap(), Some("shot010"));
        assert_eq!(fields.get(FieldKey::FileName).unwrap(), Some("shot010.%04d.exr"));
        assert_eq!(fields.get(FieldKey::FrameRange).unwrap(), Some("1001-1024"));
        assert_eq!(fields.get(FieldKey::FrameTotal).unwrap(), Some("24"));
        assert_eq!(fields.get(FieldKey::Lut).unwrap(), None);
        assert_eq!(fields.get(FieldKey::Date).unwrap().map(str::len), Some(10));
    }

    #[test]
    fn test_flags_override_fields_file() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence(dir.path());
        let file = dir.path().join("fields.json");
        std::fs::write(
            &file,
            r#"{ "project_name": "Nightfall", "shot_name": "sh010_comp", "handles": 8 }"#,
        )
        .unwrap();

        let args = FieldArgs {
            fields_file: Some(file),
            shot_name: Some("shot010_v003".to_string()),
            ..FieldArgs::default()
        };
        let fields = args.to_field_set(&seq).unwrap();
        assert_eq!(fields.get(FieldKey::ProjectName).unwrap(), Some("Nightfall"));
        assert_eq!(fields.get(FieldKey::ShotName).unwrap(), Some("shot010_v003"));
        assert_eq!(fields.get(FieldKey::Handles).unwrap(), Some("8"));
    }

    #[test]
    fn test_fields_file_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        let seq = sequence(dir.path());
        let file = dir.path().join("fields.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        let args = FieldArgs {
            fields_file: Some(file),
            ..FieldArgs::default()
        };
        assert!(args.to_field_set(&seq).is_err());
    }
}
