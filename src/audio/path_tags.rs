//! Tag inference from the folder hierarchy
//!
//! Files are expected to live under a source folder following
//!
//! ```text
//! genre/artist/year<SEP>album/track<SEP>title.ext
//! ```
//!
//! where `<SEP>` is any run of spaces, underscores, dashes or periods. Every
//! folder level is optional, but the levels that are present keep this order,
//! so `artist/year-album/track-title.ext` and `year-album/track-title.ext` are
//! both valid.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::tags::{TagKey, TagSet};

/// filename, album folder, artist folder, genre folder
pub const MAX_SEGMENTS: usize = 4;

static TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\p{L}\d _.()']+)").expect("valid text pattern"));

static NUMBERED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[- _.]+([\p{L}\d _.()']+)").expect("valid numbered pattern")
});

// Album folder names may also contain dashes
static ALBUM_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\p{L}\d _.()'-]+)").expect("valid album pattern"));

static NUMBERED_ALBUM_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[- _.]+([\p{L}\d _.()'-]+)").expect("valid numbered album pattern")
});

/// Collect `[stem, parent, grandparent, ...]` walking up from `path`.
///
/// Stops at the folder named `source_root` (not included), at the filesystem
/// root, or once `MAX_SEGMENTS` names have been collected.
pub fn path_segments(path: &Path, source_root: &str) -> Vec<String> {
    let mut segments = Vec::with_capacity(MAX_SEGMENTS);
    match path.file_stem() {
        Some(stem) => segments.push(stem.to_string_lossy().into_owned()),
        None => return segments,
    }

    let mut current = path.parent();
    while let Some(dir) = current {
        if segments.len() == MAX_SEGMENTS {
            break;
        }
        let Some(name) = dir.file_name() else { break };
        if name == source_root {
            break;
        }
        segments.push(name.to_string_lossy().into_owned());
        current = dir.parent();
    }

    segments
}

/// Infer tags for `path` from its location beneath `source_root`
pub fn tags_from_path(path: &Path, source_root: &str) -> TagSet {
    let segments = path_segments(path, source_root);
    let mut tags = TagSet::new();

    for (position, segment) in segments.iter().enumerate() {
        let parsed = match position {
            0 => parse_numbered(
                segment,
                &NUMBERED_TEXT,
                &TEXT,
                TagKey::TrackNumber,
                TagKey::Title,
            ),
            1 => parse_numbered(
                segment,
                &NUMBERED_ALBUM_TEXT,
                &ALBUM_TEXT,
                TagKey::Date,
                TagKey::Album,
            ),
            2 => parse_text(segment, TagKey::Artist),
            3 => parse_text(segment, TagKey::Genre),
            _ => break,
        };
        tags.merge_missing(parsed);
    }

    tags
}

/// `<digits><SEP><text>` or plain `<text>`
fn parse_numbered(
    segment: &str,
    numbered: &Regex,
    text: &Regex,
    number_key: TagKey,
    text_key: TagKey,
) -> TagSet {
    let mut tags = TagSet::new();
    if let Some(caps) = numbered.captures(segment) {
        tags.insert_if_absent(number_key, &caps[1]);
        tags.insert_if_absent(text_key, caps[2].trim_end());
    } else if let Some(caps) = text.captures(segment) {
        tags.insert_if_absent(text_key, caps[1].trim_end());
    } else {
        log::warn!("Can't parse {} from name: {}", text_key, segment);
    }
    tags
}

fn parse_text(segment: &str, key: TagKey) -> TagSet {
    let mut tags = TagSet::new();
    match TEXT.captures(segment) {
        Some(caps) => {
            tags.insert_if_absent(key, caps[1].trim_end());
        }
        None => log::warn!("Can't parse {} from folder name: {}", key, segment),
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(tags: &TagSet, key: TagKey) -> Option<&str> {
        tags.get(&key)
    }

    #[test]
    fn test_segments_stop_at_source_root() {
        let segments = path_segments(
            Path::new("2mp3/Rock/TheBand/1999-GreatAlbum/03-GreatSong.wav"),
            "2mp3",
        );
        assert_eq!(
            segments,
            vec!["03-GreatSong", "1999-GreatAlbum", "TheBand", "Rock"]
        );
    }

    #[test]
    fn test_segments_capped_at_four() {
        let segments = path_segments(
            Path::new("/music/2flac/Extra/Rock/TheBand/1999-GreatAlbum/03-GreatSong.wav"),
            "2flac",
        );
        assert_eq!(segments.len(), MAX_SEGMENTS);
        assert_eq!(segments[3], "Rock");
    }

    #[test]
    fn test_segments_without_source_root_stop_at_filesystem_root() {
        let segments = path_segments(Path::new("/a/b.wav"), "2mp3");
        assert_eq!(segments, vec!["b", "a"]);
    }

    #[test]
    fn test_full_path_recovers_all_six_tags() {
        let tags = tags_from_path(
            Path::new("2mp3/Rock/TheBand/1999-GreatAlbum/03-GreatSong.wav"),
            "2mp3",
        );

        assert_eq!(tags.len(), 6);
        assert_eq!(value(&tags, TagKey::TrackNumber), Some("03"));
        assert_eq!(value(&tags, TagKey::Title), Some("GreatSong"));
        assert_eq!(value(&tags, TagKey::Date), Some("1999"));
        assert_eq!(value(&tags, TagKey::Album), Some("GreatAlbum"));
        assert_eq!(value(&tags, TagKey::Artist), Some("TheBand"));
        assert_eq!(value(&tags, TagKey::Genre), Some("Rock"));
    }

    #[test]
    fn test_all_separator_kinds() {
        for name in ["07 Song", "07_Song", "07.Song", "07 - Song", "07._Song"] {
            let path = format!("2mp3/{}.wav", name);
            let tags = tags_from_path(Path::new(&path), "2mp3");
            assert_eq!(value(&tags, TagKey::TrackNumber), Some("07"), "{}", name);
            assert_eq!(value(&tags, TagKey::Title), Some("Song"), "{}", name);
        }
    }

    #[test]
    fn test_fewer_segments_fill_only_prefix() {
        let tags = tags_from_path(Path::new("2mp3/2001 Odyssey/05 Intro.flac"), "2mp3");

        assert_eq!(value(&tags, TagKey::TrackNumber), Some("05"));
        assert_eq!(value(&tags, TagKey::Title), Some("Intro"));
        assert_eq!(value(&tags, TagKey::Date), Some("2001"));
        assert_eq!(value(&tags, TagKey::Album), Some("Odyssey"));
        assert!(!tags.contains(&TagKey::Artist));
        assert!(!tags.contains(&TagKey::Genre));
    }

    #[test]
    fn test_filename_only() {
        let tags = tags_from_path(Path::new("2flac/Just A Title.wav"), "2flac");
        assert_eq!(tags.len(), 1);
        assert_eq!(value(&tags, TagKey::Title), Some("Just A Title"));
    }

    #[test]
    fn test_number_without_text_falls_back_to_title() {
        let tags = tags_from_path(Path::new("2mp3/Album/42.wav"), "2mp3");
        assert_eq!(value(&tags, TagKey::Title), Some("42"));
        assert!(!tags.contains(&TagKey::TrackNumber));
    }

    #[test]
    fn test_album_keeps_dashes_title_does_not() {
        let tags = tags_from_path(
            Path::new("2mp3/1985-Side-By-Side/01-Part-One.wav"),
            "2mp3",
        );
        assert_eq!(value(&tags, TagKey::Album), Some("Side-By-Side"));
        assert_eq!(value(&tags, TagKey::Title), Some("Part"));
    }

    #[test]
    fn test_unparseable_segment_is_skipped() {
        let tags = tags_from_path(
            Path::new("2mp3/Jazz/#Weird#/1970 Live/01 Opener.wav"),
            "2mp3",
        );
        assert!(!tags.contains(&TagKey::Artist));
        assert_eq!(value(&tags, TagKey::Genre), Some("Jazz"));
        assert_eq!(value(&tags, TagKey::Album), Some("Live"));
    }

    #[test]
    fn test_parentheses_and_apostrophes() {
        let tags = tags_from_path(
            Path::new("2mp3/Guns N' Roses/1991 Use Your Illusion (I)/02 Don't Cry.wav"),
            "2mp3",
        );
        assert_eq!(value(&tags, TagKey::Artist), Some("Guns N' Roses"));
        assert_eq!(value(&tags, TagKey::Album), Some("Use Your Illusion (I)"));
        assert_eq!(value(&tags, TagKey::Title), Some("Don't Cry"));
    }
}
