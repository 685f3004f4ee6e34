// Audio module - tag names, tag inference from paths, and embedded tag reading

pub mod detection;
pub mod file_tags;
pub mod path_tags;
pub mod tags;

pub use detection::{has_extension, lowercase_extension};
pub use file_tags::tags_from_file;
pub use path_tags::tags_from_path;
pub use tags::{merge_tags, TagKey, TagSet};
