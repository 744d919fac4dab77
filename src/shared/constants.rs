pub const APP_NAME: &str = "handclip";

pub const DEBUG_LOG_FILE: &str = "handclip.log";
pub const ERROR_LOG_FILE: &str = "error.log";

pub const ANNOTATION_PREFIX: &str = "annotations";
pub const ANNOTATION_EXTENSION: &str = "xml";
pub const VIDEO_PREFIX: &str = "cam";
pub const VIDEO_EXTENSION: &str = "mp4";

/// Element and attribute names of the annotation document
pub const TIER_TAG: &str = "TIER";
pub const TIER_ID_ATTR: &str = "columns";
pub const SPAN_TAG: &str = "span";
pub const SPAN_START_ATTR: &str = "start";
pub const SPAN_END_ATTR: &str = "end";
pub const SPAN_VALUE_TAG: &str = "v";

pub const LEFT_HAND_TIER: &str = "TrajDirection_LH";
pub const RIGHT_HAND_TIER: &str = "TrajDirection_RH";

pub const STAGING_DIR_PREFIX: &str = "Processed_";

pub const SPLIT_NAMES: [&str; 3] = ["train", "validation", "test"];
pub const DEFAULT_TRAIN_CUTOFF: f64 = 0.70;
pub const DEFAULT_VALIDATION_CUTOFF: f64 = 0.85;

pub const PARTITION_MANIFEST_FILE: &str = ".partition_manifest.json";

/// Inclusive upper bound of the random token prefixed to clip names
pub const NAME_TOKEN_MAX: u32 = 10_000_000;

pub const CLIP_FOURCC: [char; 4] = ['m', 'p', '4', 'v'];
