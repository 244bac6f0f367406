// AMV Notation Constants
// Shared by the rubric model, the note store and the persistence layer.

// Criterion defaults (applied when a rubric leaves a bound unspecified)
pub const DEFAULT_CRITERION_MIN: f64 = 0.0;
pub const DEFAULT_CRITERION_MAX: f64 = 10.0;
pub const DEFAULT_CRITERION_STEP: f64 = 0.5;
pub const DEFAULT_CRITERION_WEIGHT: f64 = 1.0;

// Criteria without a category land in this bucket
pub const DEFAULT_CATEGORY: &str = "General";

// Undo history depth (oldest snapshot discarded first)
pub const HISTORY_LIMIT: usize = 100;

// Score rounding: round(sum * 100) / 100
pub const SCORE_ROUNDING_FACTOR: f64 = 100.0;

// Distribution of a category target over its criteria
pub const DISTRIBUTE_MAX_PASSES: usize = 1200;

// Project file format
pub const PROJECT_FORMAT_VERSION: &str = "1.0";
pub const DEFAULT_PROJECT_NAME: &str = "Projet AMV";
pub const JSON_EXTENSION: &str = "json";

// Official rubric
pub const OFFICIAL_BAREME_ID: &str = "official-amv-2026";

// Judge labels
pub const CURRENT_JUDGE_KEY: &str = "current";
pub const DEFAULT_CURRENT_JUDGE_NAME: &str = "Current judge";
pub const DEFAULT_IMPORTED_JUDGE_NAME: &str = "Imported judge";

// Paths (relative to the user's Documents folder)
pub const APP_FOLDER: &str = "AMV Notation";
pub const PROJECTS_FOLDER: &str = "Projets";
pub const BAREMES_FOLDER: &str = "Baremes";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const HOME_ENV_VAR: &str = "AMV_NOTATION_HOME";
pub const BAREME_FALLBACK_FILENAME: &str = "bareme";

// User settings
pub const MAX_RECENT_PROJECTS: usize = 10;

// Project settings defaults
pub const DEFAULT_AUTO_SAVE_INTERVAL_SECS: f64 = 30.0;
pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;
pub const DEFAULT_VOLUME: f64 = 80.0;
pub const DEFAULT_THUMBNAIL_TIME_SECS: f64 = 10.0;
pub const MAX_THUMBNAIL_TIME_SECS: f64 = 600.0;

// Timecodes
pub const DEFAULT_TIMECODE_FPS: f64 = 30.0;
pub const MARKER_PREVIEW_WORDS: usize = 10;
pub const MARKER_COLOR_GLOBAL: &str = "#60a5fa";
pub const MARKER_COLOR_CATEGORY: &str = "#818cf8";
pub const MARKER_COLOR_CRITERION: &str = "#22d3ee";

// Category colors (rotating fallback palette)
pub const FALLBACK_COLOR: &str = "#6366f1";
pub const CATEGORY_COLOR_PRESETS: [&str; 8] = [
    "#fb923c", "#a78bfa", "#34d399", "#f59e0b",
    "#38bdf8", "#fb7185", "#2dd4bf", "#818cf8",
];
