// src/pipeline.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use tracing::{debug, error, info, instrument, warn};

use crate::clean::{self, CleanOptions};
use crate::config::Settings;
use crate::extract;
use crate::load::Loader;

/// What a whole run did, logged at the end. `files_failed` is how the
/// operator sees partial failure: the process still exits 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub files_seen: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    pub rows_inserted: u64,
    pub rows_deduped: usize,
}

/// Drive one batch: connect once, then extract → clean → schema → insert
/// for each file, strictly in sequence. A failing file is logged and the
/// batch moves on; only a failed connection aborts the run. The connection
/// is released on every exit path.
pub async fn run(settings: &Settings) -> Result<RunSummary> {
    let files = discover_csv_files(&settings.csv_dir)?;

    let mut loader = Loader::connect(&settings.db)
        .await
        .context("establishing MySQL connection")?;
    if files.is_empty() {
        warn!(dir = %settings.csv_dir.display(), "no csv files found");
    } else {
        info!(count = files.len(), dir = %settings.csv_dir.display(), "csv files to load");
    }

    let mut summary = RunSummary::default();
    for path in files {
        summary.files_seen += 1;
        match process_file(&path, settings, &mut loader).await {
            Ok((rows, deduped)) => {
                summary.files_loaded += 1;
                summary.rows_inserted += rows;
                summary.rows_deduped += deduped;
            }
            Err(e) => {
                summary.files_failed += 1;
                error!(file = %path.display(), "failed, continuing with next file: {:#}", e);
            }
        }
    }
    loader.close().await;

    if summary.files_failed > 0 {
        warn!(
            failed = summary.files_failed,
            seen = summary.files_seen,
            "run finished with failures"
        );
    }
    info!(
        files_seen = summary.files_seen,
        files_loaded = summary.files_loaded,
        files_failed = summary.files_failed,
        rows_inserted = summary.rows_inserted,
        rows_deduped = summary.rows_deduped,
        "run complete"
    );
    Ok(summary)
}

/// `*.csv` directly under `dir`, sorted for a stable processing order.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.csv");
    let pattern = pattern
        .to_str()
        .context("csv directory path is not valid UTF-8")?;

    let mut files: Vec<PathBuf> = glob(pattern)
        .context("building csv glob pattern")?
        .filter_map(|entry| match entry {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}

#[instrument(level = "info", skip(settings, loader), fields(file = %path.display()))]
async fn process_file(
    path: &Path,
    settings: &Settings,
    loader: &mut Loader,
) -> Result<(u64, usize)> {
    let mut frame = extract::read_csv(path)?;

    let report = clean::clean(
        &mut frame,
        &CleanOptions {
            date_column: settings.date_column.clone(),
            date_order: settings.date_order,
            dedupe_keys: settings.dedupe_keys.clone(),
        },
    );

    let applied = loader.apply_sql_dir(&settings.sql_dir).await;
    debug!(applied, "schema files applied");

    // table name is the file's base name without extension
    let table = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("file name is not valid UTF-8")?;
    let rows = loader.insert_frame(table, &frame).await?;

    info!(table, rows, deduped = report.rows_removed, "file loaded");
    Ok((rows, report.rows_removed))
}
