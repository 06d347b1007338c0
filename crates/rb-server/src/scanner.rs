//! Catalog reconciliation: bring the catalog into agreement with a
//! directory subtree.
//!
//! Walks the root recursively, filters by the supported extension set,
//! stat+classifies files with bounded concurrency, then applies the result
//! to the catalog: unknown paths are inserted with a fresh classification,
//! known paths get their size and last-seen timestamp refreshed. Per-file
//! failures are collected into the report and never abort the pass; each
//! file is applied in its own statement, so an interrupted scan leaves the
//! catalog consistent.
//!
//! Identity is the path, not the content hash (hashing every file on scan
//! would be prohibitively expensive); the optional backfill pass closes the
//! gap with upload-route identity after the fact.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use rb_core::paths::{guess_mime_type, is_media_file};
use rb_core::{EntryId, EntryOrigin, Error, MediaCategory, Result};
use rb_db::models::CatalogEntry;
use rb_db::pool::get_conn;
use rb_db::queries::entries as q_entries;
use rb_parser::ParsedMedia;

use crate::context::AppContext;
use crate::hasher;

/// Upper bound on entries hashed by a single backfill pass.
const BACKFILL_BATCH_LIMIT: i64 = 10_000;

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Re-run the heuristics engine over already-cataloged files and
    /// overwrite their cached classification.
    pub reclassify: bool,
    /// After reconciling, compute content hashes for scan-discovered
    /// entries that have none.
    pub backfill_hashes: bool,
}

/// A per-file failure recorded in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanErrorEntry {
    pub file: String,
    pub message: String,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub scanned_files: u64,
    pub new_files: u64,
    pub updated_files: u64,
    pub errors: Vec<ScanErrorEntry>,
    pub category_counts: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes_backfilled: Option<u64>,
}

impl ReconciliationReport {
    fn count_category(&mut self, category: MediaCategory) {
        *self.category_counts.entry(category.to_string()).or_insert(0) += 1;
    }
}

/// Releases the root's scan lock when the pass ends, however it ends.
struct ScanGuard {
    scans: Arc<dashmap::DashMap<PathBuf, ()>>,
    root: PathBuf,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.scans.remove(&self.root);
    }
}

/// Everything the apply phase needs to know about one discovered file.
struct FileFacts {
    path_str: String,
    file_name: String,
    size_bytes: i64,
    mime_type: String,
    parsed: ParsedMedia,
}

/// Reconcile the catalog against the directory subtree under `root`.
pub async fn reconcile(
    ctx: &AppContext,
    root: &Path,
    options: &ScanOptions,
) -> Result<ReconciliationReport> {
    let root = root
        .canonicalize()
        .map_err(|e| Error::Validation(format!("invalid scan root {}: {e}", root.display())))?;
    if !root.is_dir() {
        return Err(Error::Validation(format!(
            "scan root is not a directory: {}",
            root.display()
        )));
    }

    // One reconciler owns a root at a time.
    if ctx.active_scans.insert(root.clone(), ()).is_some() {
        return Err(Error::ScanInProgress(root.display().to_string()));
    }
    let _guard = ScanGuard {
        scans: ctx.active_scans.clone(),
        root: root.clone(),
    };

    tracing::info!(root = %root.display(), reclassify = options.reclassify, "Starting reconciliation");

    let mut report = ReconciliationReport::default();

    // --- Walk phase: collect supported files; walk errors go in the report.
    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(&root).follow_links(ctx.config.scan.follow_links) {
        match entry {
            Ok(e) => {
                if e.file_type().is_file() && is_media_file(e.path()) {
                    candidates.push(e.into_path());
                }
            }
            Err(err) => {
                let file = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                tracing::warn!(file = %file, error = %err, "Error walking directory");
                report.errors.push(ScanErrorEntry {
                    file,
                    message: err.to_string(),
                });
            }
        }
    }

    // --- Batch existence check: load all known paths under the root upfront.
    let known_paths: HashSet<String> = {
        let conn = get_conn(&ctx.db)?;
        q_entries::list_paths_with_prefix(&conn, &root.to_string_lossy())?
            .into_iter()
            .collect()
    };

    // --- Stat+classify phase with bounded concurrency.
    let semaphore = Arc::new(Semaphore::new(ctx.config.scan.concurrency.max(1)));
    let mut handles = Vec::with_capacity(candidates.len());
    for path in candidates {
        let sem = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            tokio::task::spawn_blocking(move || stat_and_classify(path)).await
        }));
    }

    // --- Apply phase: serialized catalog writes, per-file error collection.
    let conn = get_conn(&ctx.db)?;
    for handle in handles {
        match handle.await {
            Ok(Ok(Ok(facts))) => {
                report.scanned_files += 1;
                let file = facts.file_name.clone();
                if let Err(e) = apply_file(&conn, &known_paths, options, facts, &mut report) {
                    tracing::warn!(file = %file, error = %e, "Failed to apply file");
                    report.errors.push(ScanErrorEntry {
                        file,
                        message: e.to_string(),
                    });
                }
            }
            Ok(Ok(Err((path, e)))) => {
                let file = path.display().to_string();
                tracing::warn!(file = %file, error = %e, "Failed to stat file");
                report.errors.push(ScanErrorEntry {
                    file,
                    message: e.to_string(),
                });
            }
            Ok(Err(e)) | Err(e) => {
                tracing::warn!(error = %e, "Scan task panicked");
                report.errors.push(ScanErrorEntry {
                    file: String::new(),
                    message: format!("scan task panicked: {e}"),
                });
            }
        }
    }
    drop(conn);

    if options.backfill_hashes {
        report.hashes_backfilled = Some(backfill_hashes(ctx, BACKFILL_BATCH_LIMIT).await?);
    }

    tracing::info!(
        root = %root.display(),
        scanned = report.scanned_files,
        new = report.new_files,
        updated = report.updated_files,
        errors = report.errors.len(),
        "Reconciliation complete"
    );

    Ok(report)
}

/// Stat a file and run the heuristics engine. Runs on the blocking pool.
fn stat_and_classify(path: PathBuf) -> std::result::Result<FileFacts, (PathBuf, Error)> {
    let metadata = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) => return Err((path, Error::from(e))),
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let mime_type = guess_mime_type(&path);
    let parsed = rb_parser::parse(&file_name, &mime_type);

    Ok(FileFacts {
        path_str: path.to_string_lossy().to_string(),
        file_name,
        size_bytes: metadata.len() as i64,
        mime_type,
        parsed,
    })
}

/// Insert-or-refresh a single discovered file.
fn apply_file(
    conn: &rusqlite::Connection,
    known_paths: &HashSet<String>,
    options: &ScanOptions,
    facts: FileFacts,
    report: &mut ReconciliationReport,
) -> Result<()> {
    if known_paths.contains(&facts.path_str) {
        if let Some(existing) = q_entries::get_entry_by_path(conn, &facts.path_str)? {
            return refresh_existing(conn, options, &facts, existing, report);
        }
        // The entry vanished between prefetch and apply; fall through to insert.
    }

    let entry = build_entry(&facts);
    if q_entries::insert_scan_entry(conn, &entry)? {
        tracing::debug!(file = %facts.path_str, category = %entry.category, "Cataloged new file");
        report.new_files += 1;
        report.count_category(entry.category);
        return Ok(());
    }

    // A concurrent scan of an overlapping root won the insert race; the
    // constraint kept the catalog consistent, so treat the file as existing.
    match q_entries::get_entry_by_path(conn, &facts.path_str)? {
        Some(existing) => refresh_existing(conn, options, &facts, existing, report),
        None => Err(Error::Internal(format!(
            "insert of {} lost a race but the path is absent",
            facts.path_str
        ))),
    }
}

/// Refresh size/last-seen for a known path; classification stays cached
/// unless reclassification was requested.
fn refresh_existing(
    conn: &rusqlite::Connection,
    options: &ScanOptions,
    facts: &FileFacts,
    existing: CatalogEntry,
    report: &mut ReconciliationReport,
) -> Result<()> {
    if existing.size_bytes != facts.size_bytes {
        tracing::info!(
            file = %facts.path_str,
            old_size = existing.size_bytes,
            new_size = facts.size_bytes,
            "Content size changed"
        );
        report.updated_files += 1;
    }
    q_entries::mark_seen(conn, existing.id, facts.size_bytes)?;

    let category = if options.reclassify {
        let parsed = &facts.parsed;
        let (series_name, season, episode, series_key) = series_columns(parsed);
        q_entries::update_classification(
            conn,
            existing.id,
            parsed.category,
            series_name,
            season,
            episode,
            series_key,
            parsed.metadata.year.map(i64::from),
            parsed.metadata.quality,
            parsed.metadata.codec,
        )?;
        parsed.category
    } else {
        existing.category
    };
    report.count_category(category);
    Ok(())
}

/// Series columns are persisted only for TV episodes.
fn series_columns(parsed: &ParsedMedia) -> (Option<&str>, Option<i64>, Option<i64>, Option<&str>) {
    if parsed.category == MediaCategory::TvEpisode {
        let s = &parsed.series;
        (
            Some(s.series_name.as_str()),
            s.season.map(i64::from),
            s.episode.map(i64::from),
            Some(s.series_key.as_str()),
        )
    } else {
        (None, None, None, None)
    }
}

/// Build a fresh catalog entry for a newly discovered file.
fn build_entry(facts: &FileFacts) -> CatalogEntry {
    let parsed = &facts.parsed;
    let (series_name, season, episode, series_key) = series_columns(parsed);
    let now = Utc::now().to_rfc3339();

    CatalogEntry {
        id: EntryId::new(),
        path: facts.path_str.clone(),
        content_hash: None,
        file_name: facts.file_name.clone(),
        size_bytes: facts.size_bytes,
        mime_type: facts.mime_type.clone(),
        category: parsed.category,
        series_name: series_name.map(String::from),
        season_number: season,
        episode_number: episode,
        series_key: series_key.map(String::from),
        year: parsed.metadata.year.map(i64::from),
        quality_tier: parsed.metadata.quality,
        codec: parsed.metadata.codec,
        origin: EntryOrigin::Scan,
        created_at: now.clone(),
        last_seen_at: Some(now),
        last_accessed_at: None,
    }
}

/// Compute content hashes for scan-discovered entries that have none.
///
/// Hashes that would collide with an existing entry are logged and skipped;
/// identities are never merged silently. Returns the number of entries
/// backfilled.
pub async fn backfill_hashes(ctx: &AppContext, limit: i64) -> Result<u64> {
    let candidates = {
        let conn = get_conn(&ctx.db)?;
        q_entries::list_unhashed(&conn, limit)?
    };

    let mut backfilled: u64 = 0;
    for entry in candidates {
        let path = entry.path.clone();
        let hash = match tokio::task::spawn_blocking(move || hasher::hash_file(Path::new(&path)))
            .await
        {
            Ok(Ok(h)) => h,
            Ok(Err(e)) => {
                tracing::warn!(file = %entry.path, error = %e, "Failed to hash file for backfill");
                continue;
            }
            Err(e) => {
                tracing::warn!(file = %entry.path, error = %e, "Hash task panicked");
                continue;
            }
        };

        let conn = get_conn(&ctx.db)?;
        if q_entries::set_content_hash(&conn, entry.id, &hash)? {
            backfilled += 1;
        } else {
            tracing::warn!(
                file = %entry.path,
                hash = %hash,
                "Content hash collides with an existing entry; skipping backfill"
            );
        }
    }

    Ok(backfilled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::config::Config;

    fn test_ctx() -> AppContext {
        let db = rb_db::pool::init_memory_pool().unwrap();
        AppContext::new(db, Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn scan_discovers_and_classifies() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("The Great Adventure (2023) 1080p.mp4"), b"m").unwrap();
        std::fs::write(dir.path().join("Amazing Series S01E02 1080p x264.mkv"), b"t").unwrap();
        std::fs::write(dir.path().join("Kids Cartoon S01E01.mp4"), b"k").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let report = reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(report.scanned_files, 3);
        assert_eq!(report.new_files, 3);
        assert_eq!(report.updated_files, 0);
        assert!(report.errors.is_empty());
        assert_eq!(report.category_counts.get("movie"), Some(&1));
        assert_eq!(report.category_counts.get("tv_episode"), Some(&1));
        assert_eq!(report.category_counts.get("kids"), Some(&1));
    }

    #[tokio::test]
    async fn rescan_is_idempotent() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.mp4"), b"bytes").unwrap();

        let first = reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(first.new_files, 1);

        let second = reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(second.new_files, 0);
        assert_eq!(second.updated_files, 0);
        assert_eq!(second.scanned_files, 1);

        let conn = get_conn(&ctx.db).unwrap();
        assert_eq!(
            q_entries::count_entries(&conn, &Default::default()).unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn size_change_counts_as_update() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.mp4");
        std::fs::write(&file, b"short").unwrap();

        reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();
        std::fs::write(&file, b"much longer content").unwrap();

        let report = reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(report.updated_files, 1);
        assert_eq!(report.new_files, 0);

        let conn = get_conn(&ctx.db).unwrap();
        let entry = q_entries::get_entry_by_path(&conn, &file.canonicalize().unwrap().to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(entry.size_bytes, b"much longer content".len() as i64);
    }

    #[tokio::test]
    async fn size_change_does_not_reclassify_by_default() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Show S01E01.mp4");
        std::fs::write(&file, b"a").unwrap();

        reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();

        // Force a bogus cached category, then rescan without reclassify.
        let path_str = file.canonicalize().unwrap().to_string_lossy().to_string();
        let conn = get_conn(&ctx.db).unwrap();
        let entry = q_entries::get_entry_by_path(&conn, &path_str).unwrap().unwrap();
        q_entries::update_classification(
            &conn,
            entry.id,
            MediaCategory::Other,
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap();
        drop(conn);

        std::fs::write(&file, b"bb").unwrap();
        reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap();

        let conn = get_conn(&ctx.db).unwrap();
        let entry = q_entries::get_entry_by_path(&conn, &path_str).unwrap().unwrap();
        assert_eq!(entry.category, MediaCategory::Other);
        drop(conn);

        // An explicit reclassification pass restores the derived category.
        reconcile(
            &ctx,
            dir.path(),
            &ScanOptions {
                reclassify: true,
                backfill_hashes: false,
            },
        )
        .await
        .unwrap();

        let conn = get_conn(&ctx.db).unwrap();
        let entry = q_entries::get_entry_by_path(&conn, &path_str).unwrap().unwrap();
        assert_eq!(entry.category, MediaCategory::TvEpisode);
        assert_eq!(entry.season_number, Some(1));
    }

    #[tokio::test]
    async fn scan_guard_refuses_same_root() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        ctx.active_scans.insert(root.clone(), ());
        let err = reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ScanInProgress(_)));
        ctx.active_scans.remove(&root);

        // Once released, the root scans normally.
        assert!(reconcile(&ctx, dir.path(), &ScanOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn missing_root_is_validation_error() {
        let ctx = test_ctx();
        let err = reconcile(
            &ctx,
            Path::new("/definitely/not/here"),
            &ScanOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn backfill_hashes_fills_scan_entries() {
        let ctx = test_ctx();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.mp4"), b"unique bytes").unwrap();

        let report = reconcile(
            &ctx,
            dir.path(),
            &ScanOptions {
                reclassify: false,
                backfill_hashes: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(report.hashes_backfilled, Some(1));

        let conn = get_conn(&ctx.db).unwrap();
        let entries = q_entries::list_entries(
            &conn,
            &Default::default(),
            &Default::default(),
            &Default::default(),
        )
        .unwrap();
        assert!(entries[0].content_hash.is_some());
    }
}
