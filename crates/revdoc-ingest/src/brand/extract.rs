//! Brand-name cleanup: platform suffix removal and branch-name stripping.

use std::sync::LazyLock;

use regex::Regex;

/// A named branch-suffix stripping rule.
///
/// `apply` returns the remaining brand name when the rule matches, or `None`
/// to let the next rule try.
pub struct ExtractionRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

impl std::fmt::Debug for ExtractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Branch tokens that commonly appear glued to the brand without a separator.
pub const KNOWN_BRANCH_TOKENS: &[&str] = &[
    "본", "강남", "홍대", "신촌", "잠실", "역삼", "서초", "명동", "건대", "종로", "판교", "분당",
    "일산", "수원", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "제주", "송파", "마포",
    "신림", "노원", "혜화", "성수", "합정", "여의도",
];

/// Rules in priority order; the first one that matches wins.
pub const EXTRACTION_RULES: &[ExtractionRule] = &[
    ExtractionRule {
        name: "spaced_branch",
        apply: strip_spaced_branch,
    },
    ExtractionRule {
        name: "hyphen_branch",
        apply: strip_hyphen_branch,
    },
    ExtractionRule {
        name: "known_unspaced_branch",
        apply: strip_known_unspaced_branch,
    },
    ExtractionRule {
        name: "latin_glued_branch",
        apply: strip_latin_glued_branch,
    },
];

static SPACED_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\w+점$").expect("valid regex"));

static HYPHEN_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*\w+점$").expect("valid regex"));

static KNOWN_UNSPACED_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    let tokens = KNOWN_BRANCH_TOKENS.join("|");
    Regex::new(&format!(r"^(.+?)(?:{tokens})지?점$")).expect("valid regex")
});

static LATIN_GLUED_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*[A-Za-z0-9])점$").expect("valid regex"));

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `브랜드 원주단구점` / `브랜드 강남지점`
fn strip_spaced_branch(name: &str) -> Option<String> {
    let m = SPACED_BRANCH.find(name)?;
    non_empty(&name[..m.start()])
}

/// `브랜드-세종종촌점`
fn strip_hyphen_branch(name: &str) -> Option<String> {
    let m = HYPHEN_BRANCH.find(name)?;
    non_empty(&name[..m.start()])
}

/// `브랜드강남점`
fn strip_known_unspaced_branch(name: &str) -> Option<String> {
    let caps = KNOWN_UNSPACED_BRANCH.captures(name)?;
    non_empty(caps.get(1)?.as_str())
}

/// `Foo점`
fn strip_latin_glued_branch(name: &str) -> Option<String> {
    let caps = LATIN_GLUED_BRANCH.captures(name)?;
    non_empty(caps.get(1)?.as_str())
}

/// Reduce a raw brand string to the bare brand name.
///
/// Drops everything from the first `_` (the platform suffix), then applies at
/// most one rule from [`EXTRACTION_RULES`].
#[must_use]
pub fn extract_pure_brand_name(raw: &str) -> String {
    let base = raw.split('_').next().unwrap_or_default().trim();
    EXTRACTION_RULES
        .iter()
        .find_map(|rule| (rule.apply)(base))
        .unwrap_or_else(|| base.to_string())
}

/// Remove all whitespace.
#[must_use]
pub fn normalize_key(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// First three characters of the normalized key.
#[must_use]
pub fn prefix3(name: &str) -> String {
    normalize_key(name).chars().take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_platform_and_spaced_branch() {
        assert_eq!(
            extract_pure_brand_name("화락바베큐치킨 원주단구점_배달의민족"),
            "화락바베큐치킨"
        );
    }

    #[test]
    fn strips_hyphen_branch() {
        assert_eq!(
            extract_pure_brand_name("튀긴치킨싫어서구운치킨만파는집-세종종촌점"),
            "튀긴치킨싫어서구운치킨만파는집"
        );
    }

    #[test]
    fn strips_spaced_jijeom() {
        assert_eq!(extract_pure_brand_name("교촌치킨 강남역지점"), "교촌치킨");
    }

    #[test]
    fn keeps_inner_spaces_of_brand() {
        assert_eq!(extract_pure_brand_name("교촌 치킨 강남점"), "교촌 치킨");
    }

    #[test]
    fn strips_known_unspaced_token() {
        assert_eq!(extract_pure_brand_name("교촌치킨강남점"), "교촌치킨");
        assert_eq!(extract_pure_brand_name("문화치킨본점"), "문화치킨");
    }

    #[test]
    fn strips_latin_glued_branch() {
        assert_eq!(extract_pure_brand_name("Foo점_PlatformX"), "Foo");
    }

    #[test]
    fn bare_token_is_not_emptied() {
        assert_eq!(extract_pure_brand_name("강남점"), "강남점");
        assert_eq!(extract_pure_brand_name("  "), "");
    }

    #[test]
    fn only_first_matching_rule_applies() {
        // The spaced rule fires, the hyphen part is left alone.
        assert_eq!(extract_pure_brand_name("A-B점 C점"), "A-B점");
    }

    #[test]
    fn name_without_branch_is_unchanged() {
        assert_eq!(extract_pure_brand_name("치포킹"), "치포킹");
    }

    #[test]
    fn normalize_and_prefix_are_char_based() {
        assert_eq!(normalize_key(" 화락 바베큐\t치킨 "), "화락바베큐치킨");
        assert_eq!(prefix3("화락 바베큐치킨"), "화락바");
        assert_eq!(prefix3("AB"), "AB");
    }
}
