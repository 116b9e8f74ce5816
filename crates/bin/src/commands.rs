//! Subcommand implementations. Each prints one JSON document on stdout.

use crate::error::{CliError, Result};
use bokslut::ixbrl::{DirectoryStore, EntityId, ReportService, SqliteResultCache};
use bokslut::{Analyzer, AnnualReportRecord, EntityStatus, Extractor, FilingMeta, TrendSeries};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Documents parsed at the same time by `trend`.
const DEFAULT_CONCURRENCY: usize = 4;

/// Parse a `--status` argument; absent means an active entity.
pub(crate) fn parse_status(arg: Option<&str>) -> Result<EntityStatus> {
    arg.map_or_else(
        || Ok(EntityStatus::default()),
        |text| {
            serde_json::from_str(text).map_err(|source| CliError::Json {
                what: "status",
                source,
            })
        },
    )
}

pub(crate) fn extract(analyzer: &Analyzer, file: &Path) -> Result<()> {
    let record = read_record(analyzer.extractor(), file)?;
    print_json(&record)
}

pub(crate) fn analyze(analyzer: &Analyzer, file: &Path, status: &EntityStatus) -> Result<()> {
    let text = read_document(file)?;
    let analysis = analyzer.analyze(&text, &file_meta(file), status)?;
    print_json(&analysis)
}

/// Extract documents concurrently and report the trend across them.
pub(crate) async fn trend(analyzer: &Analyzer, files: Vec<PathBuf>) -> Result<()> {
    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message("Extracting documents...");

    let extractor = Arc::new(analyzer.extractor().clone());
    let mut tasks = stream::iter(files)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            tokio::task::spawn_blocking(move || {
                let result = read_record(&extractor, &path);
                (path, result)
            })
        })
        .buffer_unordered(DEFAULT_CONCURRENCY);

    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    while let Some(joined) = tasks.next().await {
        let (path, result) = joined?;
        match result {
            Ok(record) => documents.push(Document::new(&path, &record)),
            Err(e) => {
                pb.suspend(|| warn!("skipping {}: {e}", path.display()));
                skipped.push(path.display().to_string());
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Extracted {} documents", documents.len()));

    if documents.is_empty() {
        return Err(CliError::NothingExtracted);
    }

    let series = order_series(documents);
    let trend = analyzer.trend_engine().analyze(&series);
    print_json(&json!({
        "series": series,
        "trend": trend,
        "skipped": skipped,
    }))
}

/// Multi-year analysis of one entity through the filing directory.
pub(crate) fn entity(
    analyzer: &Analyzer,
    dir: &Path,
    orgnr: &str,
    years: usize,
    cache: Option<&Path>,
    status: &EntityStatus,
) -> Result<()> {
    let entity = EntityId::parse(orgnr)?;
    let store = DirectoryStore::new(dir);
    let mut service =
        ReportService::new(store.clone(), store).with_extractor(analyzer.extractor().clone());
    if let Some(path) = cache {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CliError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        info!("using record cache {}", path.display());
        service = service.with_cache(SqliteResultCache::new(path)?);
    }

    let history = service.history(&entity, years)?;
    let share_capital = history.records.first().and_then(|r| r.share_capital);
    let red_flags = analyzer
        .red_flag_analyzer()
        .analyze_series(&history.series, share_capital, status);
    let trend = analyzer.trend_engine().analyze(&history.series);

    print_json(&json!({
        "entity": entity.to_string(),
        "history": history,
        "red_flags": red_flags,
        "trend": trend,
    }))
}

/// Current-period facts of one extracted document.
#[derive(Debug, Clone)]
struct Document {
    label: String,
    period_end: Option<NaiveDate>,
    facts: bokslut::FinancialFacts,
}

impl Document {
    fn new(path: &Path, record: &AnnualReportRecord) -> Self {
        let period_end = record.period.map(|p| p.end);
        let label = period_end.map_or_else(|| file_name(path), |end| end.to_string());
        Self {
            label,
            period_end,
            facts: record.facts.clone(),
        }
    }
}

/// Most recent period first; documents without a period go last, by label.
fn order_series(mut documents: Vec<Document>) -> TrendSeries {
    documents.sort_by(|a, b| {
        b.period_end
            .cmp(&a.period_end)
            .then_with(|| a.label.cmp(&b.label))
    });
    let mut series = TrendSeries::new();
    for doc in documents {
        series.push(doc.label, doc.facts);
    }
    series
}

fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_record(extractor: &Extractor, path: &Path) -> Result<AnnualReportRecord> {
    let text = read_document(path)?;
    Ok(extractor.extract_with_meta(&text, &file_meta(path))?)
}

fn file_meta(path: &Path) -> FilingMeta {
    FilingMeta {
        document_id: Some(file_name(path)),
        ..Default::default()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
