/// Application-wide constants
/// All magic numbers and constant values should be defined here

use std::time::Duration;

/// Maximum upload size accepted by Imgur in bytes (10 MB)
pub const MAX_IMGUR_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Interval between two size samples while waiting for a file to settle
pub const STABILITY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout applied to every outbound HTTP request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Reverse image search endpoint that accepts a public image URL
pub const LENS_UPLOAD_BY_URL: &str = "https://lens.google.com/uploadbyurl";

/// Default Google API host for metadata calls
pub const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";

/// Default Google API host for media uploads
pub const DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com";

/// Mime type Drive uses for folders
pub const DRIVE_FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Content type sent for every Drive upload, whatever the real format
pub const DRIVE_UPLOAD_MIME: &str = "image/jpeg";

/// Default OAuth endpoints for installed applications
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// How long the consent redirect listener may drain open connections
pub const REDIRECT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Access tokens expiring sooner than this are refreshed before use
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// Default Imgur image endpoint
pub const IMGUR_API_URL: &str = "https://api.imgur.com/3/image";

/// Log line prefix, shared by the console and the log file
pub const LOG_PREFIX: &str = "[LOG]";

/// Emoji sequence used in startup logs
pub const SHOTLENS_EMOJI: &str = "📸🔎";
