//! Reference data bundle.
//!
//! Categorized name and code lists (equities, participants, FX pairs,
//! government bonds, short-rate benchmarks, futures) that make generated
//! values look like real market traffic. The bundle is read-only during a
//! run. Every accessor cycles its list by index and falls back to a fixed
//! literal when the list is empty, so synthesis never stalls on missing data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// File name used when persisting the bundle next to generated output.
pub const REFERENCE_FILE_NAME: &str = "realistic_reference_data.json";

/// Fallback symbol when no equities are available.
pub const DEFAULT_SYMBOL: &str = "IBM";

/// Fallback security identifier when no bonds are available.
pub const DEFAULT_CUSIP: &str = "9128202A4";

/// Fallback currency pair.
pub const DEFAULT_FX_PAIR: &str = "EUR/USD";

/// Fallback futures contract code.
pub const DEFAULT_FUTURE_CODE: &str = "ES";

/// Fallback short-term benchmark code.
pub const DEFAULT_BENCHMARK: &str = "SOFR";

const DEFAULT_FUND: &str = "ALPHA CAPITAL MGMT";
const DEFAULT_BANK: &str = "GLOBAL BANK PLC";
const DEFAULT_COMPANY: &str = "ACME INC";

/// A listed equity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equity {
    /// Ticker symbol.
    pub symbol: String,
    /// Security name.
    #[serde(default)]
    pub name: String,
}

/// A government bond line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// CUSIP identifier.
    pub cusip: String,
    /// Security class description.
    #[serde(default)]
    pub class: String,
    /// Maturity date as `YYYYMMDD`.
    #[serde(default)]
    pub maturity: String,
    /// Coupon rate in percent.
    #[serde(default)]
    pub coupon: String,
}

/// Participant names grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    /// Bank-like names.
    #[serde(default)]
    pub banks: Vec<String>,
    /// Fund-like names.
    #[serde(default)]
    pub funds: Vec<String>,
    /// Generic company names.
    #[serde(default)]
    pub companies: Vec<String>,
}

/// The full reference data bundle, as persisted in the JSON cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Listed equities.
    #[serde(default)]
    pub equities: Vec<Equity>,
    /// Participant names.
    #[serde(default)]
    pub participants: Participants,
    /// Currency pairs such as `EUR/USD`.
    #[serde(default)]
    pub fx_pairs: Vec<String>,
    /// Government bonds.
    #[serde(default)]
    pub bonds: Vec<Bond>,
    /// Short-term benchmark rate codes such as `SOFR`.
    #[serde(default)]
    pub repo: Vec<String>,
    /// Futures as `CODE:market description`.
    #[serde(default)]
    pub futures: Vec<String>,
    /// Provenance: category to source URL.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    /// When the bundle was produced, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

fn cycle<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

impl ReferenceData {
    /// Parses a bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if the text is not a bundle.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Fund-like participant name at `index`.
    #[must_use]
    pub fn fund(&self, index: usize) -> &str {
        cycle(&self.participants.funds, index).map_or(DEFAULT_FUND, String::as_str)
    }

    /// Bank-like participant name at `index`.
    #[must_use]
    pub fn bank(&self, index: usize) -> &str {
        cycle(&self.participants.banks, index).map_or(DEFAULT_BANK, String::as_str)
    }

    /// Generic company name at `index`.
    #[must_use]
    pub fn company(&self, index: usize) -> &str {
        cycle(&self.participants.companies, index).map_or(DEFAULT_COMPANY, String::as_str)
    }

    /// Equity symbol at `index`.
    #[must_use]
    pub fn symbol(&self, index: usize) -> &str {
        cycle(&self.equities, index).map_or(DEFAULT_SYMBOL, |e| e.symbol.as_str())
    }

    /// Bond CUSIP at `index`.
    #[must_use]
    pub fn cusip(&self, index: usize) -> &str {
        cycle(&self.bonds, index).map_or(DEFAULT_CUSIP, |b| b.cusip.as_str())
    }

    /// Equity at `index`, if any are known.
    #[must_use]
    pub fn equity(&self, index: usize) -> Option<&Equity> {
        cycle(&self.equities, index)
    }

    /// Currency pair at `index`, if any are known.
    #[must_use]
    pub fn fx_pair(&self, index: usize) -> Option<&str> {
        cycle(&self.fx_pairs, index).map(String::as_str)
    }

    /// Bond at `index`, if any are known.
    #[must_use]
    pub fn bond(&self, index: usize) -> Option<&Bond> {
        cycle(&self.bonds, index)
    }

    /// Futures contract code at `index`, if any are known.
    ///
    /// The market description after the first `:` is dropped.
    #[must_use]
    pub fn future_code(&self, index: usize) -> Option<&str> {
        cycle(&self.futures, index).map(|f| f.split_once(':').map_or(f.as_str(), |(code, _)| code))
    }

    /// Short-term benchmark code at `index`, if any are known.
    #[must_use]
    pub fn benchmark(&self, index: usize) -> Option<&str> {
        cycle(&self.repo, index).map(String::as_str)
    }

    /// Writes the bundle as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ReferenceError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ReferenceError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Source of a reference data bundle.
///
/// Acquisition happens once, before any synthesis starts.
pub trait ReferenceDataProvider: std::fmt::Debug {
    /// Produces the bundle.
    ///
    /// # Errors
    ///
    /// Returns a [`ReferenceError`] if the bundle cannot be acquired.
    fn fetch(&self) -> Result<ReferenceData, ReferenceError>;
}

/// Reads a previously persisted JSON bundle.
#[derive(Debug, Clone)]
pub struct CachedReferenceData {
    path: PathBuf,
}

impl CachedReferenceData {
    /// Creates a provider for the cache file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReferenceDataProvider for CachedReferenceData {
    fn fetch(&self) -> Result<ReferenceData, ReferenceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ReferenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        ReferenceData::from_json(&text).map_err(|e| ReferenceError::Invalid {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

/// A small bundle compiled into the binary, for offline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinReferenceData;

impl ReferenceDataProvider for BuiltinReferenceData {
    fn fetch(&self) -> Result<ReferenceData, ReferenceError> {
        Ok(builtin_bundle())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn builtin_bundle() -> ReferenceData {
    let equities = [
        ("AAPL", "Apple Inc. - Common Stock"),
        ("MSFT", "Microsoft Corporation - Common Stock"),
        ("IBM", "International Business Machines Corporation Common Stock"),
        ("JPM", "JP Morgan Chase & Co. Common Stock"),
        ("XOM", "Exxon Mobil Corporation Common Stock"),
        ("NVDA", "NVIDIA Corporation - Common Stock"),
    ]
    .into_iter()
    .map(|(symbol, name)| Equity {
        symbol: symbol.to_string(),
        name: name.to_string(),
    })
    .collect();

    let bonds = [
        ("91282CKQ3", "Notes", "20290531", "4.500"),
        ("912810TV0", "Bonds", "20531115", "4.750"),
        ("91282CJZ5", "Notes", "20340215", "4.000"),
    ]
    .into_iter()
    .map(|(cusip, class, maturity, coupon)| Bond {
        cusip: cusip.to_string(),
        class: class.to_string(),
        maturity: maturity.to_string(),
        coupon: coupon.to_string(),
    })
    .collect();

    ReferenceData {
        equities,
        participants: Participants {
            banks: strings(&[
                "First Harbor Bancorp",
                "Northern Trust Holdings",
                "Atlantic Financial Group",
            ]),
            funds: strings(&[
                "Blue Ridge Capital Partners",
                "Meridian Asset Management",
                "Summit Advisors Fund",
            ]),
            companies: strings(&[
                "Acme Industrial Corp",
                "Globex Logistics Inc",
                "Initech Software Ltd",
            ]),
        },
        fx_pairs: strings(&["EUR/USD", "EUR/JPY", "GBP/USD", "USD/CHF", "AUD/USD"]),
        bonds,
        repo: strings(&["SOFR", "BGCR", "TGCR", "EFFR"]),
        futures: strings(&[
            "13874A:S&P 500 STOCK INDEX - CHICAGO MERCANTILE EXCHANGE",
            "043602:UST 10Y NOTE - CHICAGO BOARD OF TRADE",
        ]),
        sources: BTreeMap::from([("builtin".to_string(), "compiled-in sample".to_string())]),
        generated_at: None,
    }
}
