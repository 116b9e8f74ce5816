//! Filings stored on disk.
//!
//! Layout: one directory per entity named by its organisation number (with or
//! without dash), one `.xhtml`/`.html` file per filing. A file stem of the form
//! `YYYY-MM-DD_YYYY-MM-DD` is read as the fiscal period.

use super::{DocumentFetcher, DocumentLister, EntityId, FilingDescriptor};
use crate::error::{IxbrlError, Result};
use crate::model::FiscalPeriod;
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

const EXTENSIONS: &[&str] = &["xhtml", "html", "htm", "xml"];

/// Directory-backed lister and fetcher.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Store rooted at a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entity_dir(&self, entity: &EntityId) -> Option<(String, PathBuf)> {
        [entity.as_str().to_string(), entity.to_string()]
            .into_iter()
            .map(|name| {
                let path = self.root.join(&name);
                (name, path)
            })
            .find(|(_, path)| path.is_dir())
    }
}

impl DocumentLister for DirectoryStore {
    fn list_filings(&self, entity: &EntityId) -> Result<Vec<FilingDescriptor>> {
        let Some((dir_name, dir)) = self.entity_dir(entity) else {
            debug!("no filing directory for {entity} under {}", self.root.display());
            return Ok(Vec::new());
        };

        let mut files: Vec<String> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)));
            if path.is_file()
                && supported
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                files.push(name.to_string());
            }
        }
        // Newest first, assuming date-like names.
        files.sort_by(|a, b| b.cmp(a));

        Ok(files
            .into_iter()
            .map(|name| FilingDescriptor {
                period: period_from_name(&name),
                filing_id: format!("{dir_name}/{name}"),
                filing_date: None,
            })
            .collect())
    }
}

impl DocumentFetcher for DirectoryStore {
    fn fetch_document(&self, filing_id: &str) -> Result<String> {
        let relative = Path::new(filing_id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(IxbrlError::FilingNotFound(filing_id.to_string()));
        }
        match fs::read(self.root.join(relative)) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(IxbrlError::FilingNotFound(filing_id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn period_from_name(name: &str) -> Option<FiscalPeriod> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    let (start, end) = stem.split_once('_')?;
    Some(FiscalPeriod::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?,
        NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?,
    ))
}
