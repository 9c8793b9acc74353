// HISTORY
pub const MAX_UNDO_HISTORY_LEN: usize = 100;
pub const MERGE_NUDGES: bool = true;

// DOCUMENT
pub const DEFAULT_DOCUMENT_SIZE: u32 = 1024;
pub const DEFAULT_LAYER_NAME: &str = "Layer";
pub const DEFAULT_FOLDER_NAME: &str = "Folder";

// EVALUATION
pub const CHECK_POOL_LEAKS: bool = true;

// PEN
pub const DEFAULT_PEN_WIDTH: u32 = 4;

// FILE
pub const FILE_FORMAT_VERSION: u32 = 1;
