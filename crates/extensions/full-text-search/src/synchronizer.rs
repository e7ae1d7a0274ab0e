//! Collection hook keeping FTS mirrors aligned with collection schemas.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::info;

use indexsync_core::{CollectionHook, Database};
use indexsync_protocols::{CollectionDescriptor, CollectionEvent, CollectionEventKind, IndexError};

use crate::schema::FtsSchema;

/// Creates, recreates and drops `<collection>_fts` for tracked collections.
///
/// A schema change drops the mirror and its triggers before the table is
/// altered (SQLite refuses to drop a column a trigger still names) and
/// recreates and rebuilds it afterwards.
pub struct FtsSynchronizer {
    tracked: HashSet<String>,
}

impl FtsSynchronizer {
    pub fn new(tracked: impl IntoIterator<Item = String>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
        }
    }

    pub fn is_tracked(&self, collection: &str) -> bool {
        self.tracked.contains(collection)
    }

    /// Create the mirror if missing, then rebuild it from the collection.
    pub async fn ensure(db: &Database, descriptor: &CollectionDescriptor) -> Result<(), IndexError> {
        let schema = FtsSchema::new(descriptor);
        db.call(move |conn| {
            let tx = conn.transaction()?;
            schema.create_in(&tx)?;
            schema.rebuild_in(&tx)?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Drop the mirror and its triggers.
    pub async fn remove(db: &Database, collection: &str) -> Result<(), IndexError> {
        let collection = collection.to_string();
        db.call(move |conn| {
            let tx = conn.transaction()?;
            FtsSchema::drop_in(&tx, &collection)?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionHook for FtsSynchronizer {
    fn name(&self) -> &str {
        "full-text-search"
    }

    async fn on_collection(&self, event: &CollectionEvent, db: &Database) -> Result<(), IndexError> {
        let descriptor = &event.collection;
        if !self.is_tracked(&descriptor.name) {
            return Ok(());
        }
        match event.kind {
            CollectionEventKind::Created | CollectionEventKind::Updated => {
                Self::ensure(db, descriptor).await?;
                info!(
                    "FTS mirror for '{}' synchronized after {:?}",
                    descriptor.name, event.kind
                );
            }
            CollectionEventKind::Updating | CollectionEventKind::Deleting => {
                Self::remove(db, &descriptor.name).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "synchronizer_tests.rs"]
mod tests;
