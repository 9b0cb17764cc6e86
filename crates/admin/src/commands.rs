use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use gamecat_core::{
    auto_fix,
    catalog::RecordFilter,
    schema, AppConfig, FieldError, MetadataSource, Notifier, NotifyOptions, RawgProvider,
    Record, RecordPatch, RecordStore,
};

use crate::render;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records, hidden ones excluded unless --all is given.
    List {
        /// Case-insensitive match against name and torrent name.
        #[arg(short, long)]
        search: Option<String>,
        /// Include hidden records.
        #[arg(long)]
        all: bool,
    },
    /// Show every field of one record.
    Show {
        /// Original torrent name of the record.
        key: String,
    },
    /// Add a record from a JSON object file.
    Add {
        #[arg(long)]
        file: PathBuf,
    },
    /// Change fields of a record.
    Edit {
        /// Original torrent name of the record.
        key: String,
        /// Field assignment, repeatable; see `gamecat fields`.
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,
    },
    /// Fetch metadata from the games database and apply it to a record.
    Fetch {
        /// Original torrent name of the record.
        key: String,
        /// Game name or numeric ID; defaults to the record's stored ID.
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Hide records without deleting them.
    Hide {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete records from the working copy.
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Re-fetch metadata for every record whose name does not match its release.
    AutoFix,
    /// Discard uncommitted edits.
    Reset,
    /// Write the working copy over the committed catalog.
    Commit,
    /// Dump every record to a JSON file.
    Export { path: PathBuf },
    /// List the editable fields and their input formats.
    Fields,
}

pub fn run(
    command: Command,
    store: &mut RecordStore,
    config: &AppConfig,
    notifier: &Notifier,
) -> Result<()> {
    match command {
        Command::List { search, all } => {
            let filter = RecordFilter {
                query: search.unwrap_or_default(),
                include_hidden: all,
            };
            render::record_table(&store.visible(&filter), store.stats());
        }
        Command::Show { key } => render::record_details(find(store, &key)?)?,
        Command::Add { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let patch = RecordPatch::from_json(value)
                .with_context(|| format!("{} must contain a JSON object", file.display()))?;
            store.add(patch)?;
        }
        Command::Edit { key, assignments } => {
            let patch = parse_assignments(&assignments)?;
            store.update(&key, patch, NotifyOptions::default())?;
        }
        Command::Fetch { key, query } => {
            let existing_id = find(store, &key)?.rawg_id;
            let provider = RawgProvider::from_settings(&config.provider_settings(), notifier.clone())?;
            let metadata = provider
                .fetch(query.as_deref(), existing_id, NotifyOptions::default())
                .ok_or_else(|| anyhow!("no game data found for '{key}'"))?;
            store.update(&key, RecordPatch::from(metadata), NotifyOptions::default())?;
        }
        Command::Hide { keys } => {
            store.hide(&keys)?;
        }
        Command::Delete { keys } => {
            store.delete(&keys)?;
        }
        Command::AutoFix => {
            let provider = RawgProvider::from_settings(&config.provider_settings(), notifier.clone())?;
            let report = auto_fix(store, &provider, NotifyOptions::default());
            render::auto_fix_report(&report);
        }
        Command::Reset => {
            store.reset()?;
        }
        Command::Commit => store.commit()?,
        Command::Export { path } => store.export(path)?,
        Command::Fields => render::schema_table(),
    }
    Ok(())
}

fn find<'a>(store: &'a RecordStore, key: &str) -> Result<&'a Record> {
    store
        .get(key)
        .ok_or_else(|| anyhow!("no record with original torrent name '{key}'"))
}

fn parse_assignments(assignments: &[String]) -> Result<RecordPatch> {
    let mut patch = RecordPatch::default();
    for assignment in assignments {
        let (field, raw) = assignment
            .split_once('=')
            .with_context(|| format!("expected FIELD=VALUE, got '{assignment}'"))?;
        let spec = schema::field_spec(field.trim())
            .ok_or_else(|| FieldError::UnknownField(field.trim().to_string()))?;
        let value = spec.parse_input(raw)?;
        patch.set_field(spec.name, value)?;
    }
    Ok(patch)
}
