use std::{collections::HashSet, path::Path};

use tracing::{debug, warn};

use super::sync::{self, CatalogSync};
use crate::{
    error::StoreError,
    events::{Notifier, NotifyOptions},
    models::{Record, RecordPatch},
};

/// Search criteria for [`RecordStore::visible`].
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring matched against name and torrent name.
    pub query: String,
    /// Include hidden records.
    pub include_hidden: bool,
}

impl RecordFilter {
    /// Filter visible records by a search string.
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            include_hidden: false,
        }
    }
}

/// Summary counts over the stored records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// All records, hidden ones included.
    pub total: usize,
    /// Records that are not hidden.
    pub visible: usize,
    /// Hidden records.
    pub hidden: usize,
    /// Records whose name and torrent name disagree.
    pub incorrect: usize,
}

/// In-memory record list backed by the working copy.
///
/// Every mutation validates its input, recomputes `is_correct`, rewrites the
/// working copy and then reports through the attached [`Notifier`]. Errors
/// are both returned and reported as [`crate::Notice::Error`].
pub struct RecordStore {
    sync: CatalogSync,
    records: Vec<Record>,
    notifier: Notifier,
}

impl RecordStore {
    /// Create an empty store. Call [`Self::load`] to read the working copy.
    pub fn new(sync: CatalogSync, notifier: Notifier) -> Self {
        Self {
            sync,
            records: Vec::new(),
            notifier,
        }
    }

    /// Prepare the working copy and load it. Failures are reported through
    /// the notifier and leave the store empty instead of aborting.
    pub fn open(sync: CatalogSync, notifier: Notifier) -> Self {
        let mut store = Self::new(sync, notifier);
        match store.sync.prepare() {
            Ok(outcome) => {
                let options = NotifyOptions::default();
                if outcome.created_committed {
                    store.notifier.info(
                        options,
                        format!(
                            "Created empty {} as it did not exist.",
                            store.sync.committed_path().display()
                        ),
                    );
                }
                if outcome.refreshed_working {
                    store.notifier.info(
                        options,
                        format!(
                            "Cloned {} to {}.",
                            store.sync.committed_path().display(),
                            store.sync.working_path().display()
                        ),
                    );
                }
            }
            Err(err) => store.report(&err),
        }
        if store.load().is_err() {
            debug!("starting with an empty record list");
        }
        store
    }

    /// Synchroniser backing this store.
    pub fn sync(&self) -> &CatalogSync {
        &self.sync
    }

    /// Notifier used for this store's notices.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Read the working copy, replacing the in-memory list.
    ///
    /// Unreadable or malformed content leaves the store empty; the error is
    /// reported and returned.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        match self.sync.read_working() {
            Ok(records) => {
                self.records = records;
                self.records.iter_mut().for_each(Record::refresh_correctness);
                self.notifier.records_changed(self.records.len());
                self.notifier.info(
                    NotifyOptions::default(),
                    format!(
                        "Loaded {} records from {}.",
                        self.records.len(),
                        self.sync.working_path().display()
                    ),
                );
                Ok(self.records.len())
            }
            Err(err) => {
                self.records.clear();
                self.notifier.records_changed(0);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Discard uncommitted edits: copy the committed file over the working
    /// copy and reload.
    pub fn reset(&mut self) -> Result<usize, StoreError> {
        self.sync.reset().inspect_err(|err| self.report(err))?;
        let count = self.load()?;
        self.notifier.info(
            NotifyOptions::default(),
            "Working copy reset to the committed catalog.",
        );
        Ok(count)
    }

    /// Write the in-memory list to the committed file.
    pub fn commit(&self) -> Result<(), StoreError> {
        self.sync
            .commit(&self.records)
            .inspect_err(|err| self.report(err))?;
        self.notifier.info(
            NotifyOptions::default(),
            format!(
                "Saved {} records to {}.",
                self.records.len(),
                self.sync.committed_path().display()
            ),
        );
        Ok(())
    }

    /// Dump the full list, hidden records included, to `destination`.
    pub fn export(&self, destination: impl AsRef<Path>) -> Result<(), StoreError> {
        let destination = destination.as_ref();
        sync::write_records(destination, &self.records).inspect_err(|err| self.report(err))?;
        self.notifier.info(
            NotifyOptions::default(),
            format!("Records exported to {}.", destination.display()),
        );
        Ok(())
    }

    /// All records in storage order, hidden ones included.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record with the given original torrent name.
    pub fn get(&self, torrent_name: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.original_torrent_name == torrent_name)
    }

    /// Records matching `filter`, sorted by lowercased name.
    pub fn visible(&self, filter: &RecordFilter) -> Vec<&Record> {
        let needle = filter.query.trim().to_lowercase();
        let mut matches: Vec<&Record> = self
            .records
            .iter()
            .filter(|record| filter.include_hidden || !record.hidden)
            .filter(|record| {
                needle.is_empty()
                    || record.name.to_lowercase().contains(&needle)
                    || record.original_torrent_name.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by_cached_key(|record| record.name.to_lowercase());
        matches
    }

    /// Summary counts.
    pub fn stats(&self) -> StoreStats {
        let hidden = self.records.iter().filter(|record| record.hidden).count();
        StoreStats {
            total: self.records.len(),
            visible: self.records.len() - hidden,
            hidden,
            incorrect: self
                .records
                .iter()
                .filter(|record| !record.is_correct)
                .count(),
        }
    }

    /// Add a record built from `patch` over an empty template.
    ///
    /// A validation error leaves the store untouched. A persistence error
    /// is returned after the record has been appended in memory; it is
    /// written out by the next successful save.
    pub fn add(&mut self, patch: RecordPatch) -> Result<&Record, StoreError> {
        let mut record = Record::default();
        patch.apply_to(&mut record);

        let result = self.check_add(&record);
        result.inspect_err(|err| self.report(err))?;

        record.refresh_correctness();
        let label = record.display_name().to_string();
        self.records.push(record);
        self.persist(NotifyOptions::default())?;
        self.notifier
            .info(NotifyOptions::default(), format!("Record '{label}' added."));
        Ok(&self.records[self.records.len() - 1])
    }

    /// Apply `patch` to the record keyed by `torrent_name`.
    ///
    /// Fields absent from the patch keep their values. The merged record
    /// must still carry every required field, and a changed torrent name
    /// must not collide with another record. `options` only controls
    /// user-facing notices; the working copy is always rewritten. As with
    /// [`Self::add`], a persistence error leaves the change applied in memory.
    pub fn update(
        &mut self,
        torrent_name: &str,
        patch: RecordPatch,
        options: NotifyOptions,
    ) -> Result<&Record, StoreError> {
        let result = self.check_update(torrent_name, patch);
        let (index, updated) = result.inspect_err(|err| self.report_with(options, err))?;

        let label = updated.display_name().to_string();
        self.records[index] = updated;
        self.persist(options)?;
        self.notifier
            .info(options, format!("Record '{label}' updated."));
        Ok(&self.records[index])
    }

    /// Remove every record whose torrent name is in `torrent_names`.
    ///
    /// Returns how many were removed; unknown names are ignored.
    pub fn delete<I, S>(&mut self, torrent_names: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = key_set(torrent_names);
        let before = self.records.len();
        self.records
            .retain(|record| !targets.contains(record.original_torrent_name.as_str()));
        let removed = before - self.records.len();

        if removed == 0 {
            self.notifier
                .info(NotifyOptions::default(), "No records were deleted.");
            return Ok(0);
        }
        self.persist(NotifyOptions::default())?;
        self.notifier.info(
            NotifyOptions::default(),
            format!("Deleted {removed} record(s)."),
        );
        Ok(removed)
    }

    /// Mark every record whose torrent name is in `torrent_names` as hidden.
    ///
    /// Records stay in storage. Returns how many records matched.
    pub fn hide<I, S>(&mut self, torrent_names: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = key_set(torrent_names);
        let mut matched = 0;
        for record in &mut self.records {
            if targets.contains(record.original_torrent_name.as_str()) {
                record.hidden = true;
                matched += 1;
            }
        }
        self.persist(NotifyOptions::default())?;
        self.notifier
            .info(NotifyOptions::default(), format!("Hid {matched} record(s)."));
        Ok(matched)
    }

    fn check_add(&self, record: &Record) -> Result<(), StoreError> {
        let missing = record.missing_required();
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }
        if self.get(&record.original_torrent_name).is_some() {
            return Err(StoreError::DuplicateKey(
                record.original_torrent_name.clone(),
            ));
        }
        Ok(())
    }

    fn check_update(
        &self,
        torrent_name: &str,
        patch: RecordPatch,
    ) -> Result<(usize, Record), StoreError> {
        let index = self
            .records
            .iter()
            .position(|record| record.original_torrent_name == torrent_name)
            .ok_or_else(|| StoreError::NotFound(torrent_name.to_string()))?;

        let mut updated = self.records[index].clone();
        patch.apply_to(&mut updated);

        let missing = updated.missing_required();
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        let new_key = &updated.original_torrent_name;
        if new_key != torrent_name {
            let taken = self
                .records
                .iter()
                .enumerate()
                .any(|(i, record)| i != index && &record.original_torrent_name == new_key);
            if taken {
                return Err(StoreError::DuplicateKey(new_key.clone()));
            }
        }

        updated.refresh_correctness();
        Ok((index, updated))
    }

    fn persist(&self, options: NotifyOptions) -> Result<(), StoreError> {
        if let Err(err) = self.sync.write_working(&self.records) {
            warn!("working copy not saved; in-memory changes are kept");
            self.report(&err);
            return Err(err);
        }
        self.notifier.info(
            options,
            format!(
                "Records saved to {}.",
                self.sync.working_path().display()
            ),
        );
        self.notifier.records_changed(self.records.len());
        Ok(())
    }

    fn report(&self, err: &StoreError) {
        self.report_with(NotifyOptions::default(), err);
    }

    fn report_with(&self, options: NotifyOptions, err: &StoreError) {
        self.notifier.error(options, err.to_string());
    }
}

fn key_set<I, S>(torrent_names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    torrent_names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{events::Notice, models::Requirements};
    use serde_json::json;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn patch(value: serde_json::Value) -> RecordPatch {
        RecordPatch::from_json(value).expect("valid patch")
    }

    fn halo() -> RecordPatch {
        patch(json!({
            "name": "Halo",
            "original_torrent_name": "Halo.Infinite-CODEX",
            "description": "d"
        }))
    }

    fn open_store() -> anyhow::Result<(TempDir, RecordStore, UnboundedReceiver<Notice>)> {
        let dir = tempdir()?;
        let sync = CatalogSync::new(dir.path().join("games.json"), dir.path().join("clone.json"));
        let (notifier, receiver) = Notifier::channel();
        let store = RecordStore::open(sync, notifier);
        Ok((dir, store, receiver))
    }

    fn drain(receiver: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    #[test]
    fn add_computes_correctness_and_persists() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        let added = store.add(halo())?;
        assert!(added.is_correct);
        assert_eq!(added.genres, Vec::<String>::new());

        let on_disk = store.sync().read_working()?;
        assert_eq!(on_disk, store.records());
        Ok(())
    }

    #[test]
    fn add_rejects_missing_required_fields() -> anyhow::Result<()> {
        let (_dir, mut store, mut rx) = open_store()?;
        drain(&mut rx);
        let err = store
            .add(patch(json!({"name": "", "original_torrent_name": "X", "description": "d"})))
            .expect_err("blank name must be rejected");
        assert!(matches!(err, StoreError::Validation(ref fields) if fields == &["name"]));
        assert!(store.records().is_empty());
        assert!(matches!(drain(&mut rx).as_slice(), [Notice::Error(_)]));
        Ok(())
    }

    #[test]
    fn add_rejects_duplicate_keys() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        let err = store.add(halo()).expect_err("duplicate must be rejected");
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.records().len(), 1);
        Ok(())
    }

    #[test]
    fn update_recomputes_correctness() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        let updated = store.update(
            "Halo.Infinite-CODEX",
            patch(json!({"name": "Forza"})),
            NotifyOptions::default(),
        )?;
        assert_eq!(updated.name, "Forza");
        assert_eq!(updated.description, "d");
        assert!(!updated.is_correct);
        Ok(())
    }

    #[test]
    fn update_unknown_key_leaves_store_untouched() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        let before = store.records().to_vec();
        let err = store
            .update("missing", patch(json!({"name": "X"})), NotifyOptions::default())
            .expect_err("unknown key");
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.records(), before.as_slice());
        Ok(())
    }

    #[test]
    fn update_can_rename_but_not_onto_another_key() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        store.add(patch(json!({
            "name": "Forza",
            "original_torrent_name": "Forza.Horizon.5-EMPRESS",
            "description": "d"
        })))?;

        let err = store
            .update(
                "Halo.Infinite-CODEX",
                patch(json!({"original_torrent_name": "Forza.Horizon.5-EMPRESS"})),
                NotifyOptions::default(),
            )
            .expect_err("collision");
        assert!(matches!(err, StoreError::DuplicateKey(_)));

        store.update(
            "Halo.Infinite-CODEX",
            patch(json!({"original_torrent_name": "Halo.MCC-FLT"})),
            NotifyOptions::default(),
        )?;
        assert!(store.get("Halo.Infinite-CODEX").is_none());
        assert!(store.get("Halo.MCC-FLT").is_some_and(|record| record.is_correct));
        Ok(())
    }

    #[test]
    fn update_rejects_blanking_a_required_field() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        let err = store
            .update(
                "Halo.Infinite-CODEX",
                patch(json!({"description": ""})),
                NotifyOptions::default(),
            )
            .expect_err("blank description");
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.records()[0].description, "d");
        Ok(())
    }

    #[test]
    fn silent_update_still_persists() -> anyhow::Result<()> {
        let (_dir, mut store, mut rx) = open_store()?;
        store.add(halo())?;
        drain(&mut rx);

        store.update(
            "Halo.Infinite-CODEX",
            patch(json!({"size": "50 GB"})),
            NotifyOptions::SILENT,
        )?;
        assert_eq!(store.sync().read_working()?[0].size, "50 GB");
        assert_eq!(drain(&mut rx), vec![Notice::RecordsChanged { total: 1 }]);
        Ok(())
    }

    #[test]
    fn delete_is_idempotent() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        assert_eq!(store.delete(["Halo.Infinite-CODEX"])?, 1);
        assert_eq!(store.delete(["Halo.Infinite-CODEX"])?, 0);
        assert!(store.sync().read_working()?.is_empty());
        Ok(())
    }

    #[test]
    fn hide_keeps_records_in_storage() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        assert_eq!(store.hide(["Halo.Infinite-CODEX", ""])?, 1);
        assert_eq!(store.records().len(), 1);
        assert!(store.get("Halo.Infinite-CODEX").is_some_and(|record| record.hidden));
        assert!(store.visible(&RecordFilter::default()).is_empty());
        assert_eq!(
            store
                .visible(&RecordFilter {
                    include_hidden: true,
                    ..RecordFilter::default()
                })
                .len(),
            1
        );
        Ok(())
    }

    #[test]
    fn visible_filters_and_sorts_by_name() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        for (name, torrent) in [("zork", "Zork-GOG"), ("Alan Wake", "Alan.Wake.2-RUNE"), ("Halo", "Halo-CODEX")] {
            store.add(patch(json!({
                "name": name,
                "original_torrent_name": torrent,
                "description": "d"
            })))?;
        }
        let all: Vec<_> = store
            .visible(&RecordFilter::default())
            .into_iter()
            .map(|record| record.name.as_str())
            .collect();
        assert_eq!(all, vec!["Alan Wake", "Halo", "zork"]);

        let found = store.visible(&RecordFilter::search(" RUNE "));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Alan Wake");
        Ok(())
    }

    #[test]
    fn commit_then_reset_round_trips() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        store.commit()?;
        let committed = store.records().to_vec();

        store.delete(["Halo.Infinite-CODEX"])?;
        assert!(store.records().is_empty());

        store.reset()?;
        assert_eq!(store.records(), committed.as_slice());
        Ok(())
    }

    #[test]
    fn load_recomputes_stale_correctness() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        std::fs::write(
            store.sync().working_path(),
            r#"[{"name": "Forza", "original_torrent_name": "Halo-CODEX", "description": "d", "is_correct": true}]"#,
        )?;
        assert_eq!(store.load()?, 1);
        assert!(!store.records()[0].is_correct);
        assert_eq!(store.stats().incorrect, 1);
        Ok(())
    }

    #[test]
    fn failed_save_keeps_the_added_record_in_memory() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        let working = store.sync().working_path().to_path_buf();
        std::fs::remove_file(&working)?;
        std::fs::create_dir(&working)?;

        let err = store.add(halo()).expect_err("working copy is a directory");
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert_eq!(store.records().len(), 1);

        let retry = store.add(halo()).expect_err("record is already held");
        assert!(matches!(retry, StoreError::DuplicateKey(_)));
        Ok(())
    }

    #[test]
    fn platforms_without_requirements_survive_load_and_persist() -> anyhow::Result<()> {
        let (_dir, mut store, _rx) = open_store()?;
        let working = json!([{
            "name": "Halo",
            "original_torrent_name": "Halo.Infinite-CODEX",
            "description": "d",
            "platforms": [
                {"id": "4", "name": "PC", "requirements": null},
                {
                    "id": 1,
                    "name": "Xbox One",
                    "requirements": {"minimum": "4 GB", "recommended": "8 GB"}
                }
            ]
        }]);
        std::fs::write(store.sync().working_path(), serde_json::to_string(&working)?)?;

        store.load()?;
        let platforms = store.records()[0].platforms.clone();
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].id, 4);
        assert_eq!(platforms[0].requirements, Requirements::unavailable());
        assert_eq!(platforms[1].requirements.recommended, "8 GB");

        store.hide(["nothing"])?;
        let persisted = store.sync().read_working()?;
        assert_eq!(persisted[0].platforms, platforms);
        Ok(())
    }

    #[test]
    fn malformed_working_copy_degrades_to_empty() -> anyhow::Result<()> {
        let (_dir, mut store, mut rx) = open_store()?;
        store.add(halo())?;
        std::fs::write(store.sync().working_path(), "[{")?;
        drain(&mut rx);

        let err = store.load().expect_err("malformed file");
        assert!(err.is_malformed());
        assert!(store.records().is_empty());
        let notices = drain(&mut rx);
        assert!(notices.iter().any(|notice| matches!(notice, Notice::Error(_))));
        Ok(())
    }

    #[test]
    fn export_writes_everything_verbatim() -> anyhow::Result<()> {
        let (dir, mut store, _rx) = open_store()?;
        store.add(halo())?;
        store.hide(["Halo.Infinite-CODEX"])?;
        let destination = dir.path().join("export.json");
        store.export(&destination)?;
        let exported: Vec<Record> = serde_json::from_str(&std::fs::read_to_string(destination)?)?;
        assert_eq!(exported, store.records());
        Ok(())
    }
}
