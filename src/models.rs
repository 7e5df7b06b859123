use serde::{Deserialize, Serialize};

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    /// Link reachable without authentication
    pub url: String,
    /// Remote identifier, present only when the backend needs a later delete
    pub remote_id: Option<String>,
}

/// What happened to one file handed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Temporary or vanished file, nothing uploaded
    Skipped,
    /// Uploaded, opened and cleaned up
    Completed,
    /// Stopped early by an error (logged)
    Failed,
}

/// Why the watch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// A pipeline run finished and set the stop signal
    Completed,
    /// The termination window elapsed
    TimedOut,
    /// The user pressed Ctrl-C
    Interrupted,
}

impl std::fmt::Display for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shutdown::Completed => write!(f, "completed"),
            Shutdown::TimedOut => write!(f, "timed out"),
            Shutdown::Interrupted => write!(f, "interrupted"),
        }
    }
}

// Imgur API

#[derive(Debug, Deserialize)]
pub struct ImgurResponse {
    pub data: ImgurImage,
}

#[derive(Debug, Deserialize)]
pub struct ImgurImage {
    pub link: String,
}

// Drive API

#[derive(Debug, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriveFileMetadata<'a> {
    pub name: &'a str,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct DrivePermission<'a> {
    pub role: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}
