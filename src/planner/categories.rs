use crate::config::CategoryTable;
use tracing::debug;

/// Decide which categories to search.
///
/// A non-empty user selection is used as given (blank entries and repeats
/// dropped). Otherwise defaults come from the companion table: the first
/// `companion_picks` companion categories, then `variety_picks` variety
/// categories, then fallback categories until `min_categories` is reached.
pub fn select_categories(
    table: &CategoryTable,
    companion: &str,
    user_selected: &[String],
) -> Vec<String> {
    let mut selected = Vec::new();
    for category in user_selected {
        push_unique(&mut selected, category);
    }
    if !selected.is_empty() {
        debug!("Using {} user-selected categories", selected.len());
        return selected;
    }

    let companion = companion.trim().to_lowercase();
    let companion_defaults = table
        .companions
        .iter()
        .find(|(k, _)| k.trim().to_lowercase() == companion)
        .map(|(_, v)| v.as_slice())
        .unwrap_or_default();

    if companion_defaults.is_empty() {
        debug!("No defaults for companion type '{}'", companion);
    }

    for category in companion_defaults.iter().take(table.companion_picks) {
        push_unique(&mut selected, category);
    }

    let mut added = 0;
    for category in &table.variety {
        if added >= table.variety_picks {
            break;
        }
        if push_unique(&mut selected, category) {
            added += 1;
        }
    }

    for category in &table.fallback {
        if selected.len() >= table.min_categories {
            break;
        }
        push_unique(&mut selected, category);
    }

    debug!(
        "Derived {} default categories for '{}': {:?}",
        selected.len(),
        companion,
        selected
    );
    selected
}

fn push_unique(selected: &mut Vec<String>, category: &str) -> bool {
    let category = category.trim();
    if category.is_empty() || selected.iter().any(|c| c == category) {
        return false;
    }
    selected.push(category.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> CategoryTable {
        let mut companions = HashMap::new();
        companions.insert("Family".to_string(), strings(&["museum", "zoo", "park", "aquarium"]));
        companions.insert("solo".to_string(), strings(&["bookstore", "cafe"]));
        CategoryTable {
            companions,
            variety: strings(&["park", "market", "gallery"]),
            fallback: strings(&["cafe", "restaurant", "landmark"]),
            companion_picks: 3,
            variety_picks: 2,
            min_categories: 6,
        }
    }

    #[test]
    fn test_user_selection_wins() {
        let user = strings(&["Cafe", "park", "Cafe", "  "]);
        assert_eq!(
            select_categories(&table(), "family", &user),
            strings(&["Cafe", "park"])
        );
    }

    #[test]
    fn test_family_defaults() {
        // museum zoo park (companion), market gallery (variety, park taken), cafe (top up to 6)
        assert_eq!(
            select_categories(&table(), "FAMILY", &[]),
            strings(&["museum", "zoo", "park", "market", "gallery", "cafe"])
        );
    }

    #[test]
    fn test_companion_defaults_differ() {
        let family = select_categories(&table(), "family", &[]);
        let solo = select_categories(&table(), "solo", &[]);
        assert_ne!(family, solo);
        assert_eq!(
            solo,
            strings(&["bookstore", "cafe", "park", "market", "restaurant", "landmark"])
        );
    }

    #[test]
    fn test_unknown_companion_uses_variety_and_fallback() {
        assert_eq!(
            select_categories(&table(), "business", &[]),
            strings(&["park", "market", "cafe", "restaurant", "landmark"])
        );
    }

    #[test]
    fn test_empty_table_gives_nothing() {
        let table = CategoryTable {
            companions: HashMap::new(),
            variety: vec![],
            fallback: vec![],
            companion_picks: 3,
            variety_picks: 2,
            min_categories: 6,
        };
        assert!(select_categories(&table, "solo", &[]).is_empty());
    }
}
