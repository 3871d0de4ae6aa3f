// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Tag normalization, shared by note creation and update.
//!
//! Tags are trimmed, empty tags are dropped, case is preserved on write, and
//! duplicates are removed comparing case-insensitively while keeping the
//! first occurrence's original casing.

use std::collections::HashSet;

/// Normalizes a raw tag sequence per the note service's tag-handling rules.
pub fn normalize_tags(raw: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for tag in raw {
        let trimmed = tag.into().trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.insert(key) {
            result.push(trimmed);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_drops_empty_and_dedupes_case_insensitively_keeping_first_casing() {
        let tags = normalize_tags(vec![" Work ", "work", "", "  ", "Home", "HOME", "home "]);
        assert_eq!(tags, vec!["Work".to_string(), "Home".to_string()]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(normalize_tags(Vec::<String>::new()).is_empty());
    }
}
