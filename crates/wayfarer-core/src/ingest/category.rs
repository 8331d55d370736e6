use crate::models::Category;

/// Ordered keyword cascade. Each keyword matches the start of a word, and
/// the first row with a match wins, so "hidden restaurant" is a hidden gem.
const CASCADE: &[(&[&str], Category)] = &[
    (&["hidden", "gem", "secret"], Category::HiddenGems),
    (
        &["food", "restaurant", "cafe", "café", "eat", "dining", "bakery"],
        Category::Food,
    ),
    (&["park", "garden", "nature", "beach"], Category::Nature),
    (&["view", "tower", "lookout", "miradouro"], Category::Viewpoints),
    (&["museum", "gallery"], Category::Museums),
    (&["shop", "market"], Category::Shopping),
    (&["bar", "night", "club"], Category::Nightlife),
];

/// Pick a category from an explicit category field, then the folder name.
///
/// An explicit value naming a category exactly ("hidden-gems", "Food") is
/// taken as is. Otherwise both texts go through the keyword cascade, the
/// explicit field first. Anything unmatched is sightseeing.
pub fn infer_category(explicit: Option<&str>, folder: Option<&str>) -> Category {
    if let Some(exact) = explicit.and_then(exact_category) {
        return exact;
    }

    explicit
        .and_then(match_keywords)
        .or_else(|| folder.and_then(match_keywords))
        .unwrap_or_default()
}

fn exact_category(raw: &str) -> Option<Category> {
    let slug = raw.trim().to_lowercase().replace([' ', '_'], "-");
    slug.parse().ok()
}

fn match_keywords(text: &str) -> Option<Category> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    CASCADE.iter().find_map(|(keywords, category)| {
        keywords
            .iter()
            .any(|keyword| words.iter().any(|word| word.starts_with(keyword)))
            .then_some(*category)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_keywords() {
        assert_eq!(
            infer_category(None, Some("Hidden Gems & Local Spots")),
            Category::HiddenGems
        );
        assert_eq!(infer_category(None, Some("Restaurants")), Category::Food);
        assert_eq!(infer_category(None, Some("Parks and Gardens")), Category::Nature);
        assert_eq!(infer_category(None, Some("Viewpoints")), Category::Viewpoints);
        assert_eq!(infer_category(None, Some("Night Life")), Category::Nightlife);
    }

    #[test]
    fn test_default_is_sightseeing() {
        assert_eq!(infer_category(None, None), Category::Sightseeing);
        assert_eq!(infer_category(None, Some("Lisbon")), Category::Sightseeing);
        assert_eq!(infer_category(Some(""), Some("")), Category::Sightseeing);
    }

    #[test]
    fn test_first_match_wins() {
        // Both "hidden" and "restaurant" match; the earlier row decides
        assert_eq!(
            infer_category(None, Some("Hidden restaurants")),
            Category::HiddenGems
        );
        assert_eq!(infer_category(None, Some("Tower market")), Category::Viewpoints);
    }

    #[test]
    fn test_explicit_field_beats_folder() {
        assert_eq!(
            infer_category(Some("museums"), Some("Hidden Gems")),
            Category::Museums
        );
        assert_eq!(
            infer_category(Some("Hidden Gems"), Some("Food")),
            Category::HiddenGems
        );
        assert_eq!(infer_category(Some("art gallery"), None), Category::Museums);
    }

    #[test]
    fn test_unmatched_explicit_falls_back_to_folder() {
        assert_eq!(infer_category(Some("misc"), Some("Food stops")), Category::Food);
    }

    #[test]
    fn test_word_prefix_not_substring() {
        // "great" contains "eat" but does not start with it
        assert_eq!(infer_category(None, Some("Great walks")), Category::Sightseeing);
    }
}
