/// Maximum page size the history endpoint will serve; larger requests are
/// clamped before the call goes out.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Default history page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Cursor-table key for the unfiltered history session. Keyword sessions
/// append `":{keyword}"`.
pub const HISTORY_CURSOR_KEY: &str = "HISTORY";

/// Quiet window (milliseconds) after the last keyword edit before a new
/// history refresh is issued.
pub const KEYWORD_DEBOUNCE_MS: u64 = 400;

/// Connect/read/write timeout (seconds) for all delivery API calls.
pub const HTTP_TIMEOUT_SECS: u64 = 15;
