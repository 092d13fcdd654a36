use std::path::PathBuf;

use clap::Subcommand;
use leanstreak_core::{Config, SnapshotStore};
use serde_json::json;

use super::{parse_now, read_log, LogFile};

#[derive(Subcommand)]
pub enum TrackerAction {
    /// List configured trackers with their stored streaks
    List,
    /// Show the stored snapshot for a tracker
    Show {
        /// Tracker name (e.g. "meditation", "noalc")
        name: String,
    },
    /// Recompute a tracker's streak from its log and store it
    Refresh {
        name: String,
        /// JSON array of timestamped entries
        #[arg(long)]
        log: PathBuf,
        /// Evaluation instant (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
    },
    /// Delete a tracker's stored snapshot
    Clear { name: String },
}

pub fn run(action: TrackerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SnapshotStore::open()?;

    match action {
        TrackerAction::List => {
            let mut rows = Vec::new();
            for tracker in &config.trackers {
                rows.push(json!({
                    "name": tracker.name,
                    "rule": tracker.rule,
                    "snapshot": store.load(&tracker.name)?,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        TrackerAction::Show { name } => {
            config.tracker(&name)?;
            let record = store
                .load(&name)?
                .ok_or_else(|| format!("no snapshot stored for '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        TrackerAction::Refresh { name, log, now } => {
            let tracker = config.tracker(&name)?;
            let entries = match read_log(&log)? {
                LogFile::Entries(entries) => entries,
                LogFile::Days(_) => {
                    return Err("tracker refresh expects an array of timestamped entries".into())
                }
            };
            let now = parse_now(now.as_deref())?;

            let previous = store.load(&name)?;
            let record = config
                .service()
                .refresh(tracker, &entries, previous.as_ref(), now)?;
            store.save(&name, &record)?;
            tracing::debug!(tracker = %name, entries = entries.len(), "snapshot saved");
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        TrackerAction::Clear { name } => {
            if store.delete(&name)? {
                println!("snapshot for '{name}' deleted");
            } else {
                println!("no snapshot stored for '{name}'");
            }
        }
    }
    Ok(())
}
