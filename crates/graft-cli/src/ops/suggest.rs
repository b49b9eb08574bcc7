//! "Did you mean" suggestions for unknown item names.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use graft_core::ResolveError;
use graft_schema::{ItemName, RegistryIndex};

/// Most suggestions shown for one unknown name
const MAX_SUGGESTIONS: usize = 3;

/// Closest index names to `query`, best match first.
pub fn suggest<'a>(query: &str, index: &'a RegistryIndex) -> Vec<&'a ItemName> {
    let matcher = SkimMatcherV2::default();
    let query = query.trim().to_lowercase();

    let mut scored: Vec<(i64, &ItemName)> = index
        .names()
        .filter_map(|name| {
            matcher
                .fuzzy_match(name.as_str(), &query)
                .map(|score| (score, name))
        })
        .collect();

    // Highest score first, ties by name for stable output
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name)
        .collect()
}

/// Turn a resolve error into a user-facing error, with suggestions for unknown names.
pub fn explain(err: ResolveError, index: &RegistryIndex) -> anyhow::Error {
    if let ResolveError::UnknownItem { name, .. } = &err {
        let hints = suggest(name, index);
        if !hints.is_empty() {
            let hints: Vec<&str> = hints.iter().map(|n| n.as_str()).collect();
            return anyhow::anyhow!("{err}\n  did you mean: {}", hints.join(", "));
        }
    }
    anyhow::Error::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_schema::RegistryItem;

    fn index() -> RegistryIndex {
        RegistryIndex::from_items(vec![
            RegistryItem::new("button", vec!["button.tsx".into()]),
            RegistryItem::new("button-group", vec!["button-group.tsx".into()]),
            RegistryItem::new("card", vec!["card.tsx".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_typo_suggests_close_names() {
        let index = index();
        let hints = suggest("buton", &index);
        assert!(!hints.is_empty());
        assert!(hints.iter().any(|n| **n == "button"));
        assert!(hints.iter().all(|n| **n != "card"));
    }

    #[test]
    fn test_unrelated_query_has_no_suggestions() {
        assert!(suggest("zzz", &index()).is_empty());
    }

    #[test]
    fn test_explain_unknown_item() {
        let err = ResolveError::UnknownItem {
            name: ItemName::new("buton"),
            required_by: None,
        };
        let message = explain(err, &index()).to_string();
        assert!(message.contains("Unknown registry item 'buton'"));
        assert!(message.contains("did you mean: button"));
    }
}
