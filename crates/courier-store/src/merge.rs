//! Set reconciliation between locally stored owner links and a remote batch.
//!
//! Given the ids linked to an owner, every id known to the store, and a batch
//! of remote entities, each remote entity lands in exactly one bucket:
//!
//! - **updated**: already linked to the owner, only attributes need refreshing
//! - **added link**: stored (under another owner) but not linked to this one
//! - **added**: not stored at all, needs a full insert
//!
//! Linked ids missing from the batch become **removed** candidates, but only
//! when the caller declares the fetch complete. A paginated or partial fetch
//! must never unlink what it simply did not see.

use std::collections::{BTreeSet, HashSet};

use courier_shared::EntityAware;
use serde::{Deserialize, Serialize};

use crate::adapter::{LinkScope, PersistenceAdapter};
use crate::error::{Result, StoreError};

/// How much of the local state a remote batch is allowed to overwrite.
///
/// No `Default`: every caller states whether its fetch was complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Unlink local ids absent from the batch
    pub allow_removal: bool,
    /// Refresh attributes of entities already linked to the owner
    pub allow_update: bool,
}

impl MergePolicy {
    /// Partial or paginated fetch: only add new relationships
    pub const fn partial() -> Self {
        Self {
            allow_removal: false,
            allow_update: false,
        }
    }

    /// Complete resync: the batch is the full remote truth for the owner
    pub const fn complete() -> Self {
        Self {
            allow_removal: true,
            allow_update: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeResult<T> {
    added_objects: Vec<T>,
    added_object_links: Vec<T>,
    updated_objects: Vec<T>,
    removed_object_ids: Vec<String>,
}

impl<T> MergeResult<T> {
    fn empty() -> Self {
        Self {
            added_objects: Vec::new(),
            added_object_links: Vec::new(),
            updated_objects: Vec::new(),
            removed_object_ids: Vec::new(),
        }
    }

    pub fn added_objects(&self) -> &[T] {
        &self.added_objects
    }

    pub fn added_object_links(&self) -> &[T] {
        &self.added_object_links
    }

    pub fn updated_objects(&self) -> &[T] {
        &self.updated_objects
    }

    pub fn removed_object_ids(&self) -> &[String] {
        &self.removed_object_ids
    }

    pub fn is_empty(&self) -> bool {
        self.added_objects.is_empty()
            && self.added_object_links.is_empty()
            && self.updated_objects.is_empty()
            && self.removed_object_ids.is_empty()
    }

    pub fn stats(&self) -> MergeStats {
        MergeStats {
            added: self.added_objects.len(),
            added_links: self.added_object_links.len(),
            updated: self.updated_objects.len(),
            removed: self.removed_object_ids.len(),
        }
    }
}

/// Bucket sizes of a [`MergeResult`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub added: usize,
    pub added_links: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Classify `remote` against the two id sets.
///
/// Duplicate ids inside `remote` keep their first occurrence; later ones are
/// dropped with a warning. Removed ids come out in ascending order, the other
/// buckets keep the batch order.
pub fn classify<T: EntityAware>(
    linked_ids: &BTreeSet<String>,
    known_ids: &BTreeSet<String>,
    remote: Vec<T>,
    policy: MergePolicy,
) -> MergeResult<T> {
    let mut result = MergeResult::empty();
    let mut seen: HashSet<String> = HashSet::with_capacity(remote.len());

    for entity in remote {
        let id = entity.entity_id().to_string();
        if seen.contains(&id) {
            tracing::warn!(entity_id = %id, "duplicate id in remote batch, keeping first");
            continue;
        }

        if linked_ids.contains(&id) {
            // exists both locally and remotely => refresh attributes only
            if policy.allow_update {
                result.updated_objects.push(entity);
            }
        } else if known_ids.contains(&id) {
            // row is already stored, only the owner link is missing
            result.added_object_links.push(entity);
        } else {
            result.added_objects.push(entity);
        }

        seen.insert(id);
    }

    if policy.allow_removal {
        result.removed_object_ids = linked_ids
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
    }

    result
}

/// Read the owner's links and the known ids through `adapter`, then
/// [`classify`] the remote batch.
pub fn compute_merge<T, A>(
    adapter: &A,
    scope: LinkScope,
    owner_id: &str,
    remote: Vec<T>,
    policy: MergePolicy,
) -> Result<MergeResult<T>>
where
    T: EntityAware,
    A: PersistenceAdapter + ?Sized,
{
    if owner_id.is_empty() {
        return Err(StoreError::InvalidInput("owner id must not be empty".into()));
    }

    let linked_ids = adapter.read_linked_ids(scope, owner_id)?;
    let known_ids = adapter.read_all_known_ids(scope)?;

    let result = classify(&linked_ids, &known_ids, remote, policy);

    let stats = result.stats();
    tracing::debug!(
        owner_id,
        ?scope,
        added = stats.added,
        added_links = stats.added_links,
        updated = stats.updated,
        removed = stats.removed,
        "merge computed"
    );

    Ok(result)
}
