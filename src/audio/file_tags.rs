//! Embedded tag extraction
//!
//! Uses `sox --info` and parses the `Comments` block of its output. Album
//! art is not reported by sox and is not read here.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::tags::{TagKey, TagSet};
use crate::conversion::{ToolCommand, ToolRunner};

static COMMENTS_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Comments\s*:").expect("valid header pattern"));

static COMMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]+)=([\p{L}\d _.()'-]+)").expect("valid comment pattern")
});

/// Build the info-dump command for `path`
pub fn info_command(sox: &str, path: &Path) -> ToolCommand {
    ToolCommand::new(sox).arg("--info").arg(path)
}

/// Read the tags embedded in `path`.
///
/// A failing tool yields an empty set; the failure is logged but never
/// propagated.
pub async fn tags_from_file(runner: &dyn ToolRunner, sox: &str, path: &Path) -> TagSet {
    let command = info_command(sox, path);
    match runner.run(&command).await {
        Ok(output) if output.success() => parse_info_output(&output.stdout),
        Ok(output) => {
            log::warn!(
                "Could not read embedded tags from {} (return code {:?}): {}",
                path.display(),
                output.code,
                output.stderr.trim()
            );
            TagSet::new()
        }
        Err(e) => {
            log::warn!("Could not read embedded tags from {}: {}", path.display(), e);
            TagSet::new()
        }
    }
}

/// Parse `key=value` lines following the `Comments` header
pub fn parse_info_output(output: &str) -> TagSet {
    let mut tags = TagSet::new();
    let mut in_comments = false;

    for line in output.lines() {
        if !in_comments {
            in_comments = COMMENTS_HEADER.is_match(line);
            continue;
        }
        if let Some(caps) = COMMENT_LINE.captures(line) {
            tags.insert_if_absent(TagKey::parse(&caps[1]), caps[2].trim_end());
        }
    }

    tags
}
