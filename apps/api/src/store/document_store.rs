//! The resume document store: one draft being edited plus the saved list.
//!
//! Every mutation is synchronous and immediately visible. Mutations that
//! touch persisted state rewrite the whole storage entry before returning.
//! When that write fails the in-memory change is kept, the error is returned
//! and the store stays marked dirty until a later write or `flush` succeeds.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    BasicsPatch, ItemId, RecordPatch, Resume, ResumeId, ResumePatch, SectionKind, SectionRecord,
};
use crate::store::export::{to_export_json, ExportArtifact};
use crate::store::storage::{PersistedState, ResumeStorage, StorageError, StoreSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{section} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        section: SectionKind,
        index: usize,
        len: usize,
    },

    #[error("No {section} item with id {id}")]
    ItemNotFound { section: SectionKind, id: ItemId },

    #[error("Resume {0} not found")]
    ResumeNotFound(ResumeId),

    #[error("Failed to persist resumes: {0}")]
    Persistence(#[from] StorageError),

    #[error("Failed to serialize resume: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Write the draft alongside the saved list so edits survive a restart.
    pub persist_draft: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            persist_draft: true,
        }
    }
}

pub struct ResumeStore {
    draft: Resume,
    resumes: Vec<Resume>,
    storage: Arc<dyn ResumeStorage>,
    options: StoreOptions,
    dirty: bool,
}

impl ResumeStore {
    /// Restores the store from `storage`.
    ///
    /// A stored draft is picked up only when draft persistence is enabled;
    /// otherwise editing starts on a fresh document.
    pub fn open(storage: Arc<dyn ResumeStorage>, options: StoreOptions) -> StoreResult<Self> {
        let snapshot = storage
            .load()?
            .map(|persisted| persisted.state)
            .unwrap_or_default();

        let draft = match snapshot.resume_data {
            Some(draft) if options.persist_draft => draft,
            _ => Resume::new(),
        };

        info!(
            "Opened resume store '{}' with {} saved resume(s)",
            storage.key(),
            snapshot.resumes.len()
        );

        Ok(Self {
            draft,
            resumes: snapshot.resumes,
            storage,
            options,
            dirty: false,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Reads
    // ────────────────────────────────────────────────────────────────────────

    pub fn draft(&self) -> &Resume {
        &self.draft
    }

    pub fn resumes(&self) -> &[Resume] {
        &self.resumes
    }

    pub fn resume(&self, id: ResumeId) -> StoreResult<&Resume> {
        self.resumes
            .iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::ResumeNotFound(id))
    }

    /// True when the last write to storage failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ────────────────────────────────────────────────────────────────────────
    // Draft
    // ────────────────────────────────────────────────────────────────────────

    /// Replaces the draft with an empty document carrying a new id.
    pub fn new_draft(&mut self) -> StoreResult<&Resume> {
        self.draft = Resume::new();
        debug!("Started new draft {}", self.draft.id);
        if self.options.persist_draft {
            self.persist()?;
        }
        Ok(&self.draft)
    }

    /// Loads a copy of a saved resume as the draft, keeping its id so the
    /// next save overwrites the saved entry.
    pub fn open_resume(&mut self, id: ResumeId) -> StoreResult<&Resume> {
        self.draft = self.resume(id)?.clone();
        debug!("Opened saved resume {id} as draft");
        if self.options.persist_draft {
            self.persist()?;
        }
        Ok(&self.draft)
    }

    /// Shallow-merges `patch` into the draft's basics.
    pub fn update_basics(&mut self, patch: BasicsPatch) -> StoreResult<()> {
        self.edit_draft(|draft| {
            patch.apply(&mut draft.basics);
            Ok(())
        })
    }

    /// Replaces every section supplied in `patch`.
    pub fn update_resume(&mut self, patch: ResumePatch) -> StoreResult<()> {
        self.edit_draft(|draft| {
            patch.apply(draft);
            Ok(())
        })
    }

    /// Appends `record` to its section and returns the new item's id.
    pub fn add<R: SectionRecord>(&mut self, record: R) -> StoreResult<ItemId> {
        self.edit_draft(|draft| Ok(R::section_mut(draft).push(record)))
    }

    /// Merges `patch` into the item with the given id.
    pub fn update<P>(&mut self, id: ItemId, patch: P) -> StoreResult<()>
    where
        P: RecordPatch,
        P::Record: SectionRecord<Patch = P>,
    {
        self.edit_draft(|draft| {
            let record = <P::Record as SectionRecord>::section_mut(draft)
                .get_mut(id)
                .ok_or(StoreError::ItemNotFound {
                    section: <P::Record as SectionRecord>::SECTION,
                    id,
                })?;
            patch.apply(record);
            Ok(())
        })
    }

    /// Merges `patch` into the item at `index`.
    pub fn update_at<P>(&mut self, index: usize, patch: P) -> StoreResult<()>
    where
        P: RecordPatch,
        P::Record: SectionRecord<Patch = P>,
    {
        self.edit_draft(|draft| {
            let section = <P::Record as SectionRecord>::section_mut(draft);
            let len = section.len();
            let record = section
                .get_at_mut(index)
                .ok_or(StoreError::IndexOutOfRange {
                    section: <P::Record as SectionRecord>::SECTION,
                    index,
                    len,
                })?;
            patch.apply(record);
            Ok(())
        })
    }

    /// Removes the item with the given id, returning it.
    pub fn remove<R: SectionRecord>(&mut self, id: ItemId) -> StoreResult<R> {
        self.edit_draft(|draft| {
            R::section_mut(draft)
                .remove(id)
                .ok_or(StoreError::ItemNotFound {
                    section: R::SECTION,
                    id,
                })
        })
    }

    /// Removes the item at `index`, shifting later items left.
    pub fn remove_at<R: SectionRecord>(&mut self, index: usize) -> StoreResult<R> {
        self.edit_draft(|draft| {
            let section = R::section_mut(draft);
            let len = section.len();
            section.remove_at(index).ok_or(StoreError::IndexOutOfRange {
                section: R::SECTION,
                index,
                len,
            })
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Saved collection
    // ────────────────────────────────────────────────────────────────────────

    /// Upserts the draft into the saved list by id, then starts a new draft.
    ///
    /// If the write fails the saved list keeps the upserted copy but the
    /// draft is not replaced, so calling this again overwrites the same entry.
    pub fn save_resume(&mut self) -> StoreResult<ResumeId> {
        let mut saved = self.draft.clone();
        saved.touch();
        let id = saved.id;
        if saved.is_blank() {
            debug!("Saving blank resume {id}");
        }

        match self.resumes.iter_mut().find(|r| r.id == id) {
            Some(existing) => {
                *existing = saved;
                info!("Updated saved resume {id}");
            }
            None => {
                self.resumes.push(saved);
                info!("Saved new resume {id}");
            }
        }

        let next = Resume::new();
        let result = self.write(&next);
        self.record_write(result)?;
        self.draft = next;
        Ok(id)
    }

    /// Removes a saved resume. The draft is never affected.
    pub fn delete_resume(&mut self, id: ResumeId) -> StoreResult<Resume> {
        let index = self
            .resumes
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::ResumeNotFound(id))?;
        let removed = self.resumes.remove(index);
        info!("Deleted resume {id}");
        self.persist()?;
        Ok(removed)
    }

    /// Builds the JSON Resume download for a saved resume.
    pub fn export_resume(&self, id: ResumeId) -> StoreResult<ExportArtifact> {
        let resume = self.resume(id)?;
        Ok(ExportArtifact::for_resume(resume)?)
    }

    /// The draft in export form, for live previews.
    pub fn preview_draft(&self) -> StoreResult<String> {
        Ok(to_export_json(&self.draft)?)
    }

    /// Rewrites the storage entry regardless of the dirty flag.
    pub fn flush(&mut self) -> StoreResult<()> {
        self.persist()?;
        info!("Flushed resume store '{}'", self.storage.key());
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    /// Runs `edit` against the draft. On success the draft's modified time is
    /// bumped and, if drafts are persisted, the state is written. A failed
    /// edit leaves the draft untouched.
    fn edit_draft<T>(
        &mut self,
        edit: impl FnOnce(&mut Resume) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let output = edit(&mut self.draft)?;
        self.draft.touch();
        if self.options.persist_draft {
            self.persist()?;
        }
        Ok(output)
    }

    fn persist(&mut self) -> StoreResult<()> {
        let result = self.write(&self.draft);
        self.record_write(result)
    }

    fn write(&self, draft: &Resume) -> Result<(), StorageError> {
        let snapshot = StoreSnapshot {
            resume_data: self.options.persist_draft.then(|| draft.clone()),
            resumes: self.resumes.clone(),
        };
        self.storage.store(&PersistedState::new(snapshot))
    }

    fn record_write(&mut self, result: Result<(), StorageError>) -> StoreResult<()> {
        match result {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to persist resume store '{}': {e}", self.storage.key());
                self.dirty = true;
                Err(e.into())
            }
        }
    }
}
