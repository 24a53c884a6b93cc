//! Catalog-wide constants and small shared types.

/// Catalog categories in display order, with the emoji used in generated
/// documents.
pub const CATEGORIES: [(&str, &str); 11] = [
    ("Computer Vision", "🖼️"),
    ("Natural Language Processing", "📝"),
    ("Speech & Audio", "🔊"),
    ("Tabular Data", "📊"),
    ("Reinforcement Learning", "🎮"),
    ("Generative Models", "🧬"),
    ("Time Series", "⏱️"),
    ("Anomaly Detection", "🔍"),
    ("Recommendation Systems", "📈"),
    ("MLOps & Infrastructure", "🔧"),
    ("Other", "🤖"),
];

/// Fallback category for missing or unknown values.
pub const OTHER_CATEGORY: &str = "Other";

/// Front matter keys every submission must define as strings.
pub const REQUIRED_FIELDS: [&str; 5] = ["title", "category", "date", "author", "github"];

/// Body sections every submission must contain, as they appear in headers.
pub const REQUIRED_SECTIONS: [&str; 7] = [
    "Description",
    "Model / Algorithm",
    "Dataset",
    "What Failed",
    "Why It Failed",
    "Logs / Metrics",
    "Lessons Learned",
];

/// Emoji the submission template puts in front of section headers.
pub const SECTION_EMOJI: [char; 8] = ['📝', '🤖', '📊', '❌', '🔍', '📈', '💡', '🔗'];

/// Emoji for a category, falling back to the "Other" emoji.
pub fn category_emoji(category: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, emoji)| *emoji)
        .unwrap_or("🤖")
}

/// True if `category` is one of the catalog categories.
pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.iter().any(|(name, _)| *name == category)
}
