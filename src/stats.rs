use std::collections::HashMap;

use crate::observation::{Category, Observation, PageResult};

/// Running `category -> label -> count` tally across all scanned pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub pages_scanned: u32,
    counts: HashMap<Category, HashMap<&'static str, u32>>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one page in. Each unique observation counts at most once per page.
    pub fn record(&mut self, page: &PageResult) {
        self.pages_scanned += 1;
        for observation in page.iter() {
            *self
                .counts
                .entry(observation.category)
                .or_default()
                .entry(observation.label)
                .or_insert(0) += 1;
        }
    }

    pub fn merge(mut self, other: Aggregate) -> Aggregate {
        self.pages_scanned += other.pages_scanned;
        for (category, labels) in other.counts {
            let entry = self.counts.entry(category).or_default();
            for (label, count) in labels {
                *entry.entry(label).or_insert(0) += count;
            }
        }
        self
    }

    pub fn count(&self, observation: &Observation) -> u32 {
        self.counts
            .get(&observation.category)
            .and_then(|labels| labels.get(observation.label))
            .copied()
            .unwrap_or(0)
    }

    /// Categories that have at least one observation, in report order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(|category| self.counts.get(category).is_some_and(|l| !l.is_empty()))
    }

    /// Labels of a category by descending count, ties by label.
    pub fn ranked(&self, category: Category) -> Vec<(&'static str, u32)> {
        let mut labels: Vec<(&'static str, u32)> = self
            .counts
            .get(&category)
            .map(|labels| labels.iter().map(|(l, c)| (*l, *c)).collect())
            .unwrap_or_default();
        labels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        labels
    }
}

/// A page that could not be scanned.
#[derive(Debug, Clone)]
pub struct SkippedPage {
    pub url: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct SurveyReport {
    pub processed_hosts: Vec<String>,
    pub skipped_pages: Vec<SkippedPage>,
    pub aggregate: Aggregate,
}
