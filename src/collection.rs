//! Batch normalization of raw records into an ordered repository collection.

use tracing::{debug, warn};

use crate::error::{CollectionError, NormalizeError};
use crate::record::{RawRecord, RepositoryRecord, fields, normalize};

/// What to do with a record that fails to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidRecordPolicy {
    /// Abort the whole batch on the first invalid record.
    #[default]
    Reject,
    /// Drop invalid records, keeping them in [`RepositoryCollection::rejected`].
    Skip,
}

/// A record dropped under [`InvalidRecordPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Zero-based position in the input.
    pub position: usize,
    pub name: Option<String>,
    pub error: NormalizeError,
}

/// Normalized repositories in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryCollection {
    records: Vec<RepositoryRecord>,
    rejected: Vec<RejectedRecord>,
}

impl RepositoryCollection {
    /// Normalizes every raw record, applying `policy` to the ones that fail.
    ///
    /// # Errors
    ///
    /// Under [`InvalidRecordPolicy::Reject`], the first invalid record aborts
    /// the batch with its position and cause.
    pub fn from_raw<I>(raw: I, policy: InvalidRecordPolicy) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut collection = Self::default();

        for (position, raw) in raw.into_iter().enumerate() {
            match normalize(&raw) {
                Ok(record) => collection.records.push(record),
                Err(error) => {
                    let name = raw.get(fields::NAME).map(str::to_string);
                    match policy {
                        InvalidRecordPolicy::Reject => {
                            return Err(CollectionError {
                                position,
                                name: name.unwrap_or_else(|| "<unnamed>".to_string()),
                                source: error,
                            });
                        }
                        InvalidRecordPolicy::Skip => {
                            warn!(
                                position,
                                name = name.as_deref().unwrap_or("<unnamed>"),
                                field = error.field(),
                                error = %error,
                                "Dropping invalid repository record"
                            );
                            collection.rejected.push(RejectedRecord {
                                position,
                                name,
                                error,
                            });
                        }
                    }
                }
            }
        }

        debug!(
            records = collection.records.len(),
            rejected = collection.rejected.len(),
            "Normalized repository batch"
        );
        Ok(collection)
    }

    pub fn records(&self) -> &[RepositoryRecord] {
        &self.records
    }

    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RepositoryRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RepositoryCollection {
    type Item = &'a RepositoryRecord;
    type IntoIter = std::slice::Iter<'a, RepositoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
