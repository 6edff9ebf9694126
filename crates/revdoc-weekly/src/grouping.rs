//! First-seen-wins brand grouping for weekly aggregation.

use revdoc_core::ReviewRecord;
use revdoc_ingest::{extract_pure_brand_name, same_brand_group};

/// Reviews that share one brand group. `brand` is the pure name of the
/// first review that opened the group.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandGroup {
    pub brand: String,
    pub reviews: Vec<ReviewRecord>,
}

impl BrandGroup {
    /// Whether `brand_name` passes the prefix + similarity gate against this group.
    #[must_use]
    pub fn accepts(&self, brand_name: &str) -> bool {
        same_brand_group(&self.brand, &extract_pure_brand_name(brand_name))
    }
}

/// Group `reviews` in encounter order.
///
/// Each review joins the first existing group whose key passes
/// [`same_brand_group`]; otherwise it opens a new group keyed by its own pure
/// brand name. Groups are never merged after the fact.
#[must_use]
pub fn group_by_brand(reviews: Vec<ReviewRecord>) -> Vec<BrandGroup> {
    let mut groups: Vec<BrandGroup> = Vec::new();
    for review in reviews {
        let pure = extract_pure_brand_name(&review.brand_name);
        if pure.is_empty() {
            tracing::debug!(review_id = %review.review_id, "weekly: skipping review without brand");
            continue;
        }
        match groups.iter_mut().find(|g| same_brand_group(&g.brand, &pure)) {
            Some(group) => group.reviews.push(review),
            None => groups.push(BrandGroup {
                brand: pure,
                reviews: vec![review],
            }),
        }
    }
    groups
}

/// The members of `reviews` that belong with `brand` under the grouping gate.
#[must_use]
pub fn select_for_brand(reviews: &[ReviewRecord], brand: &str) -> Vec<ReviewRecord> {
    let key = extract_pure_brand_name(brand);
    reviews
        .iter()
        .filter(|r| same_brand_group(&key, &extract_pure_brand_name(&r.brand_name)))
        .cloned()
        .collect()
}
