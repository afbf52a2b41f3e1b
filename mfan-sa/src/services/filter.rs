//! Blocked-term result filter
//!
//! Removes items whose lower-cased title or `type_name` contains any blocked
//! term. Plain substring containment, no word boundaries. Survivors keep
//! their relative order. Both delivery adapters call this same function.

use mfan_common::models::{BlockedTerms, ClassifiedResult, PolicyDecision};
use tracing::debug;

/// Items that survived plus how many were removed
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<ClassifiedResult>,
    pub removed: usize,
}

pub fn apply(
    items: Vec<ClassifiedResult>,
    decision: &PolicyDecision,
    terms: &BlockedTerms,
) -> FilterOutcome {
    if !decision.applies || terms.is_empty() {
        return FilterOutcome {
            kept: items,
            removed: 0,
        };
    }

    let before = items.len();
    let kept: Vec<ClassifiedResult> = items
        .into_iter()
        .filter(|item| match blocked_by(item, terms) {
            Some(term) => {
                debug!(title = %item.title, source = %item.source, term, "Result filtered");
                false
            }
            None => true,
        })
        .collect();

    FilterOutcome {
        removed: before - kept.len(),
        kept,
    }
}

/// First blocked term matched by the item's title or type_name.
pub fn blocked_by<'t>(item: &ClassifiedResult, terms: &'t BlockedTerms) -> Option<&'t str> {
    terms.first_match(&item.title.to_lowercase()).or_else(|| {
        item.type_name
            .as_deref()
            .and_then(|type_name| terms.first_match(&type_name.to_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfan_common::models::{ConfidenceOrigin, ContentType, RawResultItem};

    fn item(title: &str, type_name: Option<&str>) -> ClassifiedResult {
        let mut raw = RawResultItem::new(title);
        raw.type_name = type_name.map(str::to_string);
        ClassifiedResult::from_raw(raw, ContentType::Tv, 0.8, ConfidenceOrigin::Inferred)
    }

    fn titles(items: &[ClassifiedResult]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_blocked_title_removed_only_when_applies() {
        let terms = BlockedTerms::new(["测试"]);
        let items = vec![item("测试剧集", None), item("正常剧集", None)];

        let filtered = apply(items.clone(), &PolicyDecision::applies("VIP"), &terms);
        assert_eq!(titles(&filtered.kept), vec!["正常剧集"]);
        assert_eq!(filtered.removed, 1);

        let untouched = apply(items, &PolicyDecision::exempt("owner"), &terms);
        assert_eq!(titles(&untouched.kept), vec!["测试剧集", "正常剧集"]);
        assert_eq!(untouched.removed, 0);
    }

    #[test]
    fn test_type_name_and_case_insensitive_match() {
        let terms = BlockedTerms::new(["Adult"]);
        let items = vec![
            item("A", Some("ADULT content")),
            item("b", None),
            item("My adulthood", None),
            item("c", Some("drama")),
        ];

        let filtered = apply(items, &PolicyDecision::applies("x"), &terms);
        assert_eq!(titles(&filtered.kept), vec!["b", "c"]);
        assert_eq!(filtered.removed, 2);
    }

    #[test]
    fn test_order_preserved() {
        let terms = BlockedTerms::new(["x"]);
        let items = vec![item("a", None), item("x1", None), item("b", None), item("c", None)];
        let filtered = apply(items, &PolicyDecision::applies("x"), &terms);
        assert_eq!(titles(&filtered.kept), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_terms_keep_everything() {
        let filtered = apply(
            vec![item("anything", None)],
            &PolicyDecision::applies("x"),
            &BlockedTerms::default(),
        );
        assert_eq!(filtered.kept.len(), 1);
    }
}
