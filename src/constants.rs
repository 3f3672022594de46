pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_SCORES_PATH: &str = "scores_philosophy.json";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "topic_tally=info,warn";

/// Telegram refuses `sendMessage` texts longer than this, counted in UTF-16 code units
pub const MESSAGE_LENGTH_LIMIT: usize = 4096;

// poll backoff bounds
pub const BACKOFF_INITIAL_SECS: u64 = 1;
pub const BACKOFF_MAX_SECS: u64 = 60;

// CHAT TRIGGERS
pub const TABLE_TRIGGER: &str = "!т";
pub const TABLE_COMMANDS: [&str; 2] = ["start", "t"];

// REPLY TEXT
pub const TABLE_HEADER: &str = "Баллы по философии:";
pub const EMPTY_TABLE: &str = "Таблица пуста.";
