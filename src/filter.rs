use std::path::Path;

use crate::config::Config;

/// Decides which paths are finished screenshots worth handing to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    formats: Vec<String>,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl FileFilter {
    pub fn new(formats: Vec<String>, prefixes: Vec<String>, suffixes: Vec<String>) -> Self {
        Self {
            formats: formats.into_iter().map(|f| f.to_lowercase()).collect(),
            prefixes,
            suffixes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.supported_formats.clone(),
            config.temporary_files.prefixes.clone(),
            config.temporary_files.suffixes.clone(),
        )
    }

    /// Editor and OS artifacts, matched on the file name only.
    pub fn is_temporary(&self, path: &Path) -> bool {
        let Some(name) = file_name(path) else {
            return false;
        };
        self.prefixes.iter().any(|p| !p.is_empty() && name.starts_with(p.as_str()))
            || self.suffixes.iter().any(|s| !s.is_empty() && name.ends_with(s.as_str()))
    }

    /// Case-insensitive suffix match against the allow-list.
    pub fn has_supported_format(&self, path: &Path) -> bool {
        let lowered = path.to_string_lossy().to_lowercase();
        self.formats.iter().any(|f| lowered.ends_with(f.as_str()))
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
