use sha2::{Digest, Sha256};

/// Length of a review fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 20;

/// The six fields that identify a review for duplicate detection.
///
/// `rating` is the already-formatted text form and `created_at` is the empty
/// string when the source did not supply one.
#[derive(Debug, Clone, Copy)]
pub struct ReviewIdentity<'a> {
    pub brand: &'a str,
    pub store: &'a str,
    pub platform: &'a str,
    pub rating: &'a str,
    pub text: &'a str,
    pub created_at: &'a str,
}

/// SHA-256 over the `|`-joined identity fields, truncated to
/// [`FINGERPRINT_LEN`] lowercase hex characters.
#[must_use]
pub fn review_fingerprint(identity: &ReviewIdentity<'_>) -> String {
    let joined = [
        identity.brand,
        identity.store,
        identity.platform,
        identity.rating,
        identity.text,
        identity.created_at,
    ]
    .join("|");
    let mut hex = format!("{:x}", Sha256::digest(joined.as_bytes()));
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ReviewIdentity<'static> {
        ReviewIdentity {
            brand: "화락바베큐치킨 원주단구점_배달의민족",
            store: "원주단구점",
            platform: "배달의민족",
            rating: "5",
            text: "맛있어요",
            created_at: "2025-01-06T10:00:00Z",
        }
    }

    #[test]
    fn fingerprint_is_deterministic_and_fixed_length() {
        let a = review_fingerprint(&base());
        let b = review_fingerprint(&base());
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn each_field_changes_fingerprint() {
        let original = review_fingerprint(&base());
        let mutations = [
            ReviewIdentity { brand: "다른브랜드", ..base() },
            ReviewIdentity { store: "강남점", ..base() },
            ReviewIdentity { platform: "쿠팡이츠", ..base() },
            ReviewIdentity { rating: "4", ..base() },
            ReviewIdentity { text: "별로예요", ..base() },
            ReviewIdentity { created_at: "", ..base() },
            ReviewIdentity { created_at: "2025-01-06T10:00:01Z", ..base() },
        ];
        for mutated in &mutations {
            assert_ne!(
                review_fingerprint(mutated),
                original,
                "mutation did not change fingerprint: {mutated:?}"
            );
        }
    }

    #[test]
    fn field_boundaries_matter() {
        let left = ReviewIdentity {
            store: "ab",
            platform: "c",
            ..base()
        };
        let right = ReviewIdentity {
            store: "a",
            platform: "bc",
            ..base()
        };
        assert_ne!(review_fingerprint(&left), review_fingerprint(&right));
    }

    #[test]
    fn empty_created_at_is_stable() {
        let identity = ReviewIdentity {
            created_at: "",
            ..base()
        };
        assert_eq!(review_fingerprint(&identity), review_fingerprint(&identity));
    }
}
