//! Filing sources and result caching.
//!
//! Extraction itself never touches the network or the filesystem. Callers
//! that need to locate filings plug in a [`DocumentLister`] and a
//! [`DocumentFetcher`], and optionally a [`ResultCache`].

pub mod directory;

pub use directory::DirectoryStore;

use crate::error::{IxbrlError, Result};
use crate::model::{AnnualReportRecord, FiscalPeriod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A Swedish organisation number, normalized to ten digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and normalize an organisation number.
    ///
    /// Accepts ten digits (`NNNNNN-NNNN`) or twelve with a century prefix;
    /// separators and spaces are ignored. The last digit must be a valid
    /// Luhn check digit.
    pub fn parse(input: &str) -> Result<Self> {
        let digits: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IxbrlError::InvalidEntityId(format!(
                "{input}: only digits are allowed"
            )));
        }
        let digits = match digits.len() {
            10 => digits,
            12 => digits[2..].to_string(),
            _ => {
                return Err(IxbrlError::InvalidEntityId(format!(
                    "{input}: expected 10 or 12 digits"
                )));
            }
        };
        if !luhn_valid(&digits) {
            return Err(IxbrlError::InvalidEntityId(format!(
                "{input}: invalid check digit"
            )));
        }
        Ok(Self(digits))
    }

    /// The ten digits without separator.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..6], &self.0[6..])
    }
}

impl FromStr for EntityId {
    type Err = IxbrlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = IxbrlError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Luhn check over the whole digit string, doubling every second digit from
/// the right starting with the second-to-last.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// A filing available for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingDescriptor {
    /// Identifier understood by the matching [`DocumentFetcher`]
    pub filing_id: String,
    /// Registered fiscal period, if known
    pub period: Option<FiscalPeriod>,
    /// Registration date, if known
    pub filing_date: Option<NaiveDate>,
}

/// Lists the filings of an entity, most recent first.
pub trait DocumentLister {
    /// Filing descriptors for an entity.
    fn list_filings(&self, entity: &EntityId) -> Result<Vec<FilingDescriptor>>;
}

/// Fetches the decoded text of a filing.
pub trait DocumentFetcher {
    /// Document text for a filing id.
    fn fetch_document(&self, filing_id: &str) -> Result<String>;
}

/// Stores extracted records keyed by entity and filing.
pub trait ResultCache {
    /// Cached record, if present and fresh.
    fn get(&self, entity: &EntityId, filing_id: &str) -> Result<Option<AnnualReportRecord>>;

    /// Store a record.
    fn put(&self, entity: &EntityId, filing_id: &str, record: &AnnualReportRecord) -> Result<()>;
}
