use serde::Serialize;
use std::collections::HashMap;

use crate::analyzers::utility::fraction;

/// One label of a [`FrequencyTable`] with its count and share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub label: String,
    pub count: usize,
    pub share: f64,
}

/// Counts of categorical labels, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrequencyTable {
    total: usize,
    entries: Vec<FrequencyEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one label. Bulk counting goes through [`Extend`], which
    /// updates the shares once at the end.
    pub fn add(&mut self, label: &str) {
        self.extend([label]);
    }

    fn count_one(&mut self, label: &str) {
        self.total += 1;
        match self.index.get(label) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(FrequencyEntry {
                    label: label.to_string(),
                    count: 1,
                    share: 0.0,
                });
            }
        }
    }

    fn refresh_shares(&mut self) {
        let total = self.total;
        for entry in &mut self.entries {
            entry.share = fraction(entry.count, total);
        }
    }

    /// Number of labels counted, duplicates included.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct labels.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, label: &str) -> usize {
        self.index.get(label).map_or(0, |&i| self.entries[i].count)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    /// The `n` most frequent labels. Ties keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<FrequencyEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

impl<'a> Extend<&'a str> for FrequencyTable {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for label in iter {
            self.count_one(label);
        }
        self.refresh_shares();
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        table.extend(iter);
        table
    }
}
