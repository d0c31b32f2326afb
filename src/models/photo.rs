//! Photo set normalization
//!
//! Asset photos live in two fields for backward compatibility: a legacy
//! single `photo` reference (always the primary) and a `gallery` list added
//! later. The normalizer rebuilds a bounded, deduplicated set from both on
//! every call instead of mutating either field in place.

/// Maximum number of photo references an asset may carry
pub const MAX_PHOTOS: usize = 5;

/// Rebuild a photo set from the legacy primary reference plus the gallery.
///
/// Insertion order is preserved, duplicates and blank references are
/// dropped, and the result is capped at [`MAX_PHOTOS`]. The primary
/// reference, when set, always lands at index 0.
pub fn normalize_photo_set(primary: Option<&str>, gallery: &[String]) -> Vec<String> {
    let mut set: Vec<String> = Vec::with_capacity(MAX_PHOTOS);
    let refs = primary
        .into_iter()
        .chain(gallery.iter().map(String::as_str));
    for r in refs {
        let r = r.trim();
        if r.is_empty() || set.iter().any(|seen| seen == r) {
            continue;
        }
        set.push(r.to_string());
        if set.len() == MAX_PHOTOS {
            break;
        }
    }
    set
}

/// Move `primary` to index 0, inserting it if absent, keeping the cap.
pub fn promote_primary(set: &mut Vec<String>, primary: &str) {
    let primary = primary.trim();
    if primary.is_empty() {
        return;
    }
    set.retain(|r| r != primary);
    set.insert(0, primary.to_string());
    set.truncate(MAX_PHOTOS);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bound_and_dedup() {
        let gallery = refs(&["a", "b", "a", "c", "d", "e", "f", "g"]);
        let set = normalize_photo_set(Some("a"), &gallery);
        assert_eq!(set, refs(&["a", "b", "c", "d", "e"]));
    }

    #[test]
    fn test_primary_first() {
        let gallery = refs(&["b", "c"]);
        let set = normalize_photo_set(Some("a"), &gallery);
        assert_eq!(set[0], "a");
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_blank_refs_dropped() {
        let gallery = refs(&["", "  ", "b"]);
        let set = normalize_photo_set(None, &gallery);
        assert_eq!(set, refs(&["b"]));
    }

    #[test]
    fn test_promote_existing() {
        let mut set = refs(&["a", "b", "c"]);
        promote_primary(&mut set, "c");
        assert_eq!(set, refs(&["c", "a", "b"]));
    }

    #[test]
    fn test_promote_missing_respects_cap() {
        let mut set = refs(&["a", "b", "c", "d", "e"]);
        promote_primary(&mut set, "z");
        assert_eq!(set[0], "z");
        assert_eq!(set.len(), MAX_PHOTOS);
        assert!(!set.contains(&"e".to_string()));
    }
}
