use std::io::Write;

use chrono::Utc;

use crate::error::Error;
use crate::snapshot::{ExportOptions, Snapshot};
use crate::store::ExportProgress;
use crate::types::Category;

use super::open_wiki;
use super::pickers::confirm_action;

pub(super) fn print_progress(progress: ExportProgress) {
    eprint!("\rEncoding images {}/{}", progress.completed, progress.total);
    if progress.completed == progress.total {
        eprintln!();
    }
    let _ = std::io::stderr().flush();
}

fn default_backup_name() -> String {
    format!("lorebook-backup-{}.json", Utc::now().format("%Y-%m-%d"))
}

pub async fn run_export(
    data_dir: String,
    file: Option<String>,
    no_images: bool,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;
    let file = file.unwrap_or_else(default_backup_name);

    let options = ExportOptions {
        include_images: !no_images,
        ..ExportOptions::backup()
    };
    let snapshot = wiki
        .snapshot_codec()
        .export(options, Some(&print_progress))
        .await?;

    tokio::fs::write(&file, snapshot.to_json_pretty()?).await?;

    println!(
        "Exported {} records and {} images to {file}",
        snapshot.records.len(),
        snapshot.image_count()
    );
    Ok(())
}

pub async fn run_import(
    data_dir: String,
    file: String,
    non_interactive: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let text = tokio::fs::read_to_string(&file).await?;
    let snapshot = match Snapshot::from_json(&text) {
        Ok(snapshot) => snapshot,
        Err(e @ Error::InvalidSnapshot(_)) => anyhow::bail!("{}\n{e}", e.user_message()),
        Err(e) => return Err(e.into()),
    };

    if !confirm_action(
        "Replace all current wiki data with this backup?",
        yes,
        non_interactive,
    )? {
        println!("Cancelled.");
        return Ok(());
    }

    let summary = wiki.snapshot_codec().import(snapshot).await?;

    println!(
        "Imported {} records and {} images",
        summary.records_written, summary.images_written
    );
    if summary.records_skipped + summary.images_skipped > 0 {
        println!(
            "Skipped {} unknown records and {} unreadable images",
            summary.records_skipped, summary.images_skipped
        );
    }
    Ok(())
}

/// Loads every category so stored records are upgraded and written back.
pub fn run_migrate(data_dir: String) -> anyhow::Result<()> {
    let (_, wiki) = open_wiki(&data_dir)?;

    let mut total = 0;
    for category in Category::ACTIVE {
        let characters = wiki.characters(category)?;
        println!("{:<18} {} character(s)", category.label(), characters.len());
        total += characters.len();
    }

    println!("Checked {total} characters");
    Ok(())
}
