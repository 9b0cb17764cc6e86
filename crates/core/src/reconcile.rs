//! Batch repair of records whose name and release name disagree.

use tracing::{info, warn};

use crate::{
    catalog::{correctness::search_key, RecordStore},
    events::NotifyOptions,
    models::RecordPatch,
    provider::MetadataSource,
};

/// Aggregate outcome of an [`auto_fix`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoFixReport {
    /// Records that failed the correctness check.
    pub candidates: usize,
    /// Provider lookups performed.
    pub attempted: usize,
    /// Records rewritten with provider data.
    pub updated: usize,
    /// Records without a usable search key.
    pub skipped: usize,
    /// Lookups that found nothing, or whose result the store rejected.
    pub failed: usize,
}

/// Re-query the provider for every incorrect record and apply what it finds.
///
/// Records are processed one at a time in storage order. The search key is
/// the release name up to its first `-`; release names without a hyphen
/// are searched whole. Provider data wins over stored values for the fields
/// it supplies; release fields are kept. Per-record failures never abort
/// the batch. `options` controls only the final summary notice; every
/// per-record fetch and update runs silently.
pub fn auto_fix<S>(store: &mut RecordStore, source: &S, options: NotifyOptions) -> AutoFixReport
where
    S: MetadataSource + ?Sized,
{
    let candidates: Vec<String> = store
        .records()
        .iter()
        .filter(|record| !record.is_correct)
        .map(|record| record.original_torrent_name.clone())
        .collect();

    let mut report = AutoFixReport {
        candidates: candidates.len(),
        ..AutoFixReport::default()
    };
    if candidates.is_empty() {
        store
            .notifier()
            .info(options, "No incorrect records to auto-fix.");
        return report;
    }

    info!(count = candidates.len(), "auto-fix started");
    let total = candidates.len();
    for (position, torrent_name) in candidates.iter().enumerate() {
        let position = position + 1;
        info!("[{position}/{total}] processing {torrent_name}");

        let key = search_key(torrent_name);
        if torrent_name.trim().is_empty() || key.is_empty() {
            info!("[{position}/{total}] skipped: no search key");
            report.skipped += 1;
            continue;
        }

        report.attempted += 1;
        let Some(metadata) = source.fetch(Some(key), None, NotifyOptions::SILENT) else {
            warn!("[{position}/{total}] no data found for '{key}'");
            report.failed += 1;
            continue;
        };

        match store.update(torrent_name, RecordPatch::from(metadata), NotifyOptions::SILENT) {
            Ok(_) => {
                info!("[{position}/{total}] updated from provider");
                report.updated += 1;
            }
            Err(err) => {
                warn!("[{position}/{total}] update rejected: {err}");
                report.failed += 1;
            }
        }
    }

    info!(
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "auto-fix complete"
    );
    store.notifier().info(
        options,
        format!(
            "Auto-fix complete: {} of {} incorrect record(s) updated ({} skipped, {} failed).",
            report.updated, report.candidates, report.skipped, report.failed
        ),
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CatalogSync,
        events::{Notice, Notifier},
        provider::ExternalMetadata,
    };
    use serde_json::json;
    use std::{cell::RefCell, collections::HashMap};
    use tempfile::{tempdir, TempDir};

    /// Answers searches from a fixed table and records every query.
    #[derive(Default)]
    struct FakeSource {
        answers: HashMap<String, ExternalMetadata>,
        queries: RefCell<Vec<(Option<String>, Option<u64>, bool)>>,
    }

    impl FakeSource {
        fn answer(mut self, query: &str, name: &str, description: &str) -> Self {
            self.answers.insert(
                query.to_string(),
                ExternalMetadata {
                    name: name.to_string(),
                    description: description.to_string(),
                    rawg_id: Some(7),
                    genres: vec!["Shooter".to_string()],
                    ..ExternalMetadata::default()
                },
            );
            self
        }
    }

    impl MetadataSource for FakeSource {
        fn fetch(
            &self,
            query: Option<&str>,
            existing_id: Option<u64>,
            options: NotifyOptions,
        ) -> Option<ExternalMetadata> {
            self.queries
                .borrow_mut()
                .push((query.map(str::to_string), existing_id, options.notify));
            query.and_then(|query| self.answers.get(query).cloned())
        }
    }

    fn store_with(records: &[(&str, &str)]) -> anyhow::Result<(TempDir, RecordStore)> {
        let dir = tempdir()?;
        let sync = CatalogSync::new(dir.path().join("games.json"), dir.path().join("clone.json"));
        let mut store = RecordStore::open(sync, Notifier::disabled());
        for (name, torrent) in records {
            store.add(RecordPatch::from_json(json!({
                "name": name,
                "original_torrent_name": torrent,
                "description": "stored",
                "size": "10 GB",
                "rawg_id": 99
            }))?)?;
        }
        Ok((dir, store))
    }

    #[test]
    fn correct_catalog_makes_no_calls() -> anyhow::Result<()> {
        let (_dir, mut store) = store_with(&[("Halo", "Halo.Infinite-CODEX")])?;
        let source = FakeSource::default();
        let report = auto_fix(&mut store, &source, NotifyOptions::default());
        assert_eq!(report, AutoFixReport::default());
        assert!(source.queries.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn repairs_incorrect_records_silently() -> anyhow::Result<()> {
        let (_dir, mut store) = store_with(&[
            ("Forza", "Halo Infinite-CODEX"),
            ("Halo", "Halo.MCC-FLT"),
        ])?;
        let source = FakeSource::default().answer("Halo Infinite", "Halo Infinite", "Master Chief");

        let report = auto_fix(&mut store, &source, NotifyOptions::default());
        assert_eq!(report.candidates, 1);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(
            *source.queries.borrow(),
            vec![(Some("Halo Infinite".to_string()), None, false)]
        );

        let fixed = store.get("Halo Infinite-CODEX").expect("still keyed by torrent name");
        assert!(fixed.is_correct);
        assert_eq!(fixed.description, "Master Chief");
        assert_eq!(fixed.rawg_id, Some(7));
        assert_eq!(fixed.genres, vec!["Shooter"]);
        assert_eq!(fixed.size, "10 GB");
        assert_eq!(store.sync().read_working()?, store.records());
        Ok(())
    }

    #[test]
    fn failures_and_skips_do_not_stop_the_batch() -> anyhow::Result<()> {
        let (_dir, mut store) = store_with(&[
            ("Wrong", "-NOGROUP"),
            ("Wrong", "Unknown Game-CODEX"),
            ("Wrong", "Blank Description-CODEX"),
            ("Wrong", "Portal 2-GOG"),
        ])?;
        let source = FakeSource::default()
            .answer("Blank Description", "Blank Description", "")
            .answer("Portal 2", "Portal 2", "Puzzles");

        let report = auto_fix(&mut store, &source, NotifyOptions::SILENT);
        assert_eq!(
            report,
            AutoFixReport {
                candidates: 4,
                attempted: 3,
                updated: 1,
                skipped: 1,
                failed: 2,
            }
        );
        assert!(store.get("Portal 2-GOG").is_some_and(|record| record.is_correct));
        assert_eq!(
            store
                .get("Blank Description-CODEX")
                .map(|record| record.description.as_str()),
            Some("stored")
        );
        Ok(())
    }

    #[test]
    fn summary_notice_respects_options() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sync = CatalogSync::new(dir.path().join("games.json"), dir.path().join("clone.json"));
        let (notifier, mut receiver) = Notifier::channel();
        let mut store = RecordStore::open(sync, notifier);
        store.add(RecordPatch::from_json(json!({
            "name": "Wrong",
            "original_torrent_name": "Portal 2-GOG",
            "description": "d"
        }))?)?;
        while receiver.try_recv().is_ok() {}

        let source = FakeSource::default().answer("Portal 2", "Portal 2", "Puzzles");
        auto_fix(&mut store, &source, NotifyOptions::LOUD);
        let notices: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
        let infos: Vec<_> = notices
            .iter()
            .filter_map(|notice| match notice {
                Notice::Info(message) => Some(message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].starts_with("Auto-fix complete: 1 of 1"));
        Ok(())
    }
}
