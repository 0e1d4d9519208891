use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;

pub const REDACTION_CHAR: char = 'X';

const GROUP_SEPARATOR: char = '-';

/// Masks every dash-separated group except the last one.
pub fn redact_key(key: &str) -> String {
    let groups: Vec<&str> = key.split(GROUP_SEPARATOR).collect();
    let last = groups.len().saturating_sub(1);
    groups
        .iter()
        .enumerate()
        .map(|(idx, group)| {
            if idx == last {
                (*group).to_string()
            } else {
                mask(group)
            }
        })
        .collect::<Vec<_>>()
        .join(&GROUP_SEPARATOR.to_string())
}

pub fn display_key(key: &str, show_keys: bool) -> Cow<'_, str> {
    if show_keys {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(redact_key(key))
    }
}

fn mask(group: &str) -> String {
    std::iter::repeat(REDACTION_CHAR)
        .take(group.graphemes(true).count())
        .collect()
}
