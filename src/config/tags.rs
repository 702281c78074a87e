//! qBittorrent tag parsing.
//!
//! Tags arrive as one comma-separated string (`%G`). Only `filter:<expr>` is understood;
//! the expression is everything after the first ':' and is handed to filebot verbatim.

use tracing::debug;

use crate::errors::{QbotError, Result};

const FILTER_PREFIX: &str = "filter";

/// Extract the filebot filter expression from a tag list.
///
/// Unknown tags are ignored. If several `filter:` tags are present the last wins.
pub fn filter_from_tags(tags: &str) -> Result<Option<String>> {
    let mut filter = None;
    for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let Some((key, value)) = tag.split_once(':') else {
            debug!(tag, "ignoring tag without a value");
            continue;
        };
        if key.trim() != FILTER_PREFIX {
            debug!(tag, "ignoring unknown tag");
            continue;
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(QbotError::Configuration(format!(
                "tag '{tag}' has an empty filter expression"
            )));
        }
        filter = Some(value.to_string());
    }
    Ok(filter)
}
