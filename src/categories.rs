/// Labels accepted when no allow-list is configured. These are the `alt`
/// texts calend.ru puts on category icons.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Международные праздники",
    "Праздники России",
    "Праздники славян",
    "Праздники ООН",
    "Православные праздники",
];

/// Allow-list of category labels, kept in configuration order.
///
/// Matching is exact: no case folding, trimming or partial matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    /// Build a set from labels, dropping repeats but keeping first-seen order.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        Self { labels: unique }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|known| known == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}
