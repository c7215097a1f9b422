//! Markdown note loader and writer.
//!
//! A note on disk is an optional YAML front-matter block fenced by `---`
//! lines, followed by the body:
//!
//! ```text
//! ---
//! tags:
//! - fruit
//! ---
//! Apples are red.
//! ```
//!
//! [`render_markdown`] always emits the fenced block, even for empty
//! metadata (`{}`), so a written note reads back with the same metadata.

use zk_chat_core::{MetaValue, Metadata, ZkError, ZkResult};

const FENCE: &str = "---";

/// Split raw file text into `(metadata, body)`.
///
/// Text without a leading `---` line has no front-matter. Blank lines
/// between the closing fence and the body are dropped. `path` is only used
/// for error reporting.
pub fn parse_markdown(path: &str, raw: &str) -> ZkResult<(Metadata, String)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let after_open = match strip_fence_line(raw) {
        Some(rest) => rest,
        None => return Ok((Metadata::new(), raw.to_string())),
    };

    let mut offset = 0;
    let mut close: Option<(usize, usize)> = None;
    for line in after_open.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == FENCE || trimmed == "..." {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }

    let (yaml_end, body_start) = match close {
        Some(bounds) => bounds,
        // An opening fence with no closing fence is just body text.
        None => return Ok((Metadata::new(), raw.to_string())),
    };

    let yaml = &after_open[..yaml_end];
    let metadata = if yaml.trim().is_empty() {
        Metadata::new()
    } else {
        let value: MetaValue =
            serde_yaml::from_str(yaml).map_err(|e| ZkError::serialization(path, e))?;
        match value {
            MetaValue::Map(map) => map,
            MetaValue::Null => Metadata::new(),
            _ => return Err(ZkError::serialization(path, "front-matter is not a mapping")),
        }
    };

    let body = after_open[body_start..]
        .trim_start_matches(['\n', '\r'])
        .to_string();
    Ok((metadata, body))
}

/// Render metadata and body as `---\n<yaml>---\n<body>`.
pub fn render_markdown(path: &str, metadata: &Metadata, body: &str) -> ZkResult<String> {
    let yaml = serde_yaml::to_string(metadata).map_err(|e| ZkError::serialization(path, e))?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n{body}"))
}

fn strip_fence_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
