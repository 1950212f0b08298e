//! Image sequence patterns and on-disk frame range resolution.
//!
//! A sequence pattern is a file path whose file name carries a frame-number
//! token: a printf-style integer (`%04d`, `%d`) or a run of padding
//! characters. A lone `#` means four digits; otherwise every `#` or `@`
//! stands for one digit.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use dailies_common::error::{DailiesError, DailiesResult};

/// A parsed sequence pattern, not yet matched against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePattern {
    /// The pattern as supplied by the caller.
    raw: String,
    /// Directory to scan.
    dir: PathBuf,
    /// File name text before the frame token.
    prefix: String,
    /// File name text after the frame token.
    suffix: String,
    /// Minimum digit count; 0 means unpadded.
    padding: usize,
}

impl SequencePattern {
    /// Parse a pattern. Fails when the file name has no frame token.
    pub fn parse(pattern: &str) -> DailiesResult<Self> {
        let path = Path::new(pattern);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DailiesError::sequence_not_found(pattern))?;

        let token = frame_token_regex()
            .find_iter(file_name)
            .last()
            .ok_or_else(|| {
                DailiesError::config(format!(
                    "Sequence pattern has no frame number placeholder: {pattern}"
                ))
            })?;

        let padding = token_padding(token.as_str());
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            raw: pattern.to_string(),
            dir,
            prefix: file_name[..token.start()].to_string(),
            suffix: file_name[token.end()..].to_string(),
            padding,
        })
    }

    /// The pattern as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Directory holding the frames.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Minimum digit count of the frame number.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// File name pattern in printf form, e.g. `shot010.%04d.exr`.
    pub fn printf_file_name(&self) -> String {
        let token = if self.padding > 1 {
            format!("%0{}d", self.padding)
        } else {
            "%d".to_string()
        };
        format!("{}{}{}", self.prefix, token, self.suffix)
    }

    /// Full pattern in printf form, as the media engine expects it.
    pub fn printf_path(&self) -> PathBuf {
        self.dir.join(self.printf_file_name())
    }

    /// File name of one concrete frame.
    pub fn frame_file_name(&self, frame: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            frame,
            self.suffix,
            width = self.padding
        )
    }

    /// Parse the frame number out of a concrete file name, if it belongs to
    /// this sequence.
    pub fn match_frame(&self, file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let frame: u64 = digits.parse().ok()?;
        // Must round-trip through the padding rule, so `%04d` never matches
        // `01001` or `1`.
        (self.frame_file_name(frame) == file_name).then_some(frame)
    }

    /// Scan the directory and resolve the frame range.
    pub fn resolve(&self) -> DailiesResult<SequenceDescriptor> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(
                    dir = %self.dir.display(),
                    error = %err,
                    "Cannot scan sequence directory"
                );
                return Err(DailiesError::sequence_not_found(&self.raw));
            }
        };

        let mut frames: Vec<u64> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| self.match_frame(name))
            })
            .collect();

        if frames.is_empty() {
            return Err(DailiesError::sequence_not_found(&self.raw));
        }
        frames.sort_unstable();

        let descriptor = SequenceDescriptor {
            pattern: self.clone(),
            frames,
        };
        tracing::debug!(
            pattern = %self.raw,
            start = descriptor.start(),
            end = descriptor.end(),
            count = descriptor.frame_count(),
            "Resolved sequence"
        );
        Ok(descriptor)
    }
}

/// A sequence resolved against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDescriptor {
    pattern: SequencePattern,
    /// Sorted frame numbers found on disk.
    frames: Vec<u64>,
}

impl SequenceDescriptor {
    /// First frame on disk.
    pub fn start(&self) -> u64 {
        self.frames[0]
    }

    /// Last frame on disk.
    pub fn end(&self) -> u64 {
        self.frames[self.frames.len() - 1]
    }

    /// Number of frame files found.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame numbers between start and end with no file on disk.
    pub fn missing_frames(&self) -> Vec<u64> {
        let mut missing = Vec::new();
        for pair in self.frames.windows(2) {
            missing.extend(pair[0] + 1..pair[1]);
        }
        missing
    }

    /// The parsed pattern.
    pub fn pattern(&self) -> &SequencePattern {
        &self.pattern
    }

    /// File name of the pattern as supplied, e.g. `shot010.%04d.exr`.
    pub fn file_name(&self) -> String {
        Path::new(self.pattern.as_str())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Name of the sequence without frame token and extension,
    /// e.g. `shot010`.
    pub fn base_name(&self) -> String {
        self.pattern
            .prefix
            .trim_end_matches(['.', '_', '-'])
            .to_string()
    }

    /// `start-end` as shown on slates.
    pub fn frame_range(&self) -> String {
        format!("{}-{}", self.start(), self.end())
    }
}

/// Resolve a sequence pattern against the filesystem.
pub fn resolve(pattern: &str) -> DailiesResult<SequenceDescriptor> {
    SequencePattern::parse(pattern)?.resolve()
}

fn frame_token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"%0?\d*d|[#@]+").expect("frame token regex is valid"))
}

fn token_padding(token: &str) -> usize {
    if let Some(spec) = token.strip_prefix('%') {
        let digits = spec.trim_end_matches('d');
        return digits.parse().unwrap_or(0);
    }
    if token == "#" {
        4
    } else {
        token.chars().count()
    }
}
