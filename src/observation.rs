use std::collections::BTreeSet;
use std::fmt;

/// Coarse purpose of a piece of noscript content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    AlternativeContent,
    TrackingMetrics,
    Other,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 3] = [
        Category::AlternativeContent,
        Category::TrackingMetrics,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::AlternativeContent => "alternative_content",
            Category::TrackingMetrics => "tracking_metrics",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(category, label)` finding produced by a tag handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Observation {
    pub category: Category,
    pub label: &'static str,
}

impl Observation {
    pub const fn new(category: Category, label: &'static str) -> Self {
        Self { category, label }
    }

    pub const fn alternative(label: &'static str) -> Self {
        Self::new(Category::AlternativeContent, label)
    }

    pub const fn tracking(label: &'static str) -> Self {
        Self::new(Category::TrackingMetrics, label)
    }

    pub const fn other(label: &'static str) -> Self {
        Self::new(Category::Other, label)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.label)
    }
}

/// Unique observations of one logical page, both captures combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    observations: BTreeSet<Observation>,
}

impl PageResult {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn contains(&self, observation: &Observation) -> bool {
        self.observations.contains(observation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }
}

impl FromIterator<Observation> for PageResult {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}
