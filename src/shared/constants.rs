/// Name of the session cookie set on login and cleared on logout
pub const SESSION_COOKIE: &str = "nexus_session";

/// Cumulative size ceiling for post attachments (100 MB)
pub const MAX_TOTAL_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Non-admin authors may delete their own comment only this long after posting
pub const COMMENT_DELETE_WINDOW_SECS: i64 = 60;
