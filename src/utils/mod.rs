pub mod identifier;

pub use identifier::{content_filter, normalize_identifier, path_segment, NOTE_NAME_PREFIX};
