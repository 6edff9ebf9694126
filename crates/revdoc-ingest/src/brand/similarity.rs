use super::extract::{normalize_key, prefix3};

/// Minimum similarity for two names sharing a prefix to be grouped together.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// `1 - levenshtein / max_len` over the whitespace-stripped names, in `[0, 1]`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_key(a);
    let b = normalize_key(b);
    if a == b {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Grouping gate: same 3-character prefix and similarity at or above
/// [`SIMILARITY_THRESHOLD`].
#[must_use]
pub fn same_brand_group(a: &str, b: &str) -> bool {
    prefix3(a) == prefix3(b) && similarity(a, b) >= SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_after_stripping_is_one() {
        assert!((similarity("화락 바베큐치킨", "화락바베큐치킨") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_variants_pass_threshold() {
        assert!(similarity("화락바베큐치킨", "화락숯불바베큐치킨") >= SIMILARITY_THRESHOLD);
    }

    #[test]
    fn unrelated_names_fail_threshold() {
        assert!(similarity("화락바베큐치킨", "완전히다른이름") < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn gate_requires_prefix_and_similarity() {
        assert!(same_brand_group("A가게", "A 가게"));
        assert!(!same_brand_group("A가게", "B가게"));
        // Same prefix but too far apart.
        assert!(!same_brand_group("교촌치킨", "교촌치아주다른긴이름의가게"));
        // Similar but different prefix.
        assert!(!same_brand_group("화락바베큐치킨", "화락숯불바베큐치킨"));
    }
}
