use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Airline;
use crate::error::LogoError;

/// Anything that can produce the ordered airline list for a run.
pub trait EntityCatalog {
    fn airlines(&self) -> Result<Vec<Airline>, LogoError>;
}

/// A fixed, already built list. Used by tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<Airline>);

impl EntityCatalog for StaticCatalog {
    fn airlines(&self) -> Result<Vec<Airline>, LogoError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Shorthand(String),
    Detailed(CatalogEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogEntryObject {
    #[serde(default)]
    pub iata: Option<String>,
    pub icao: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingStats {
    pub label: String,
    pub unique: usize,
    pub contributed: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub listings: Vec<ListingStats>,
    pub combined: usize,
}

#[derive(Debug, Clone)]
pub struct MergedCatalog {
    pub airlines: Vec<Airline>,
    pub stats: CatalogStats,
}

/// Listings stored as JSON files, merged in the order given.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    paths: Vec<PathBuf>,
}

impl JsonCatalog {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn load(&self) -> Result<MergedCatalog, LogoError> {
        let mut listings = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let label = path.display().to_string();
            listings.push((label, read_listing(path)?));
        }
        let merged = merge_listings(listings);
        if merged.airlines.is_empty() {
            return Err(LogoError::EmptyCatalog);
        }
        Ok(merged)
    }
}

impl EntityCatalog for JsonCatalog {
    fn airlines(&self) -> Result<Vec<Airline>, LogoError> {
        Ok(self.load()?.airlines)
    }
}

pub fn read_listing(path: &Path) -> Result<Vec<Airline>, LogoError> {
    let content =
        fs::read_to_string(path).map_err(|_| LogoError::CatalogRead(path.to_path_buf()))?;
    parse_listing(&content).map_err(|message| LogoError::CatalogParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses one listing. Rows with an invalid ICAO are dropped, the way a
/// scraped table skips malformed rows.
pub fn parse_listing(content: &str) -> Result<Vec<Airline>, String> {
    let entries: Vec<CatalogEntry> =
        serde_json::from_str(content).map_err(|err| err.to_string())?;
    let airlines = entries
        .into_iter()
        .filter_map(|entry| {
            let parsed = match &entry {
                CatalogEntry::Shorthand(icao) => Airline::from_codes(None, icao),
                CatalogEntry::Detailed(obj) => Airline::from_codes(obj.iata.as_deref(), &obj.icao),
            };
            match parsed {
                Ok(airline) => Some(airline),
                Err(err) => {
                    tracing::debug!("dropping catalog row: {err}");
                    None
                }
            }
        })
        .collect();
    Ok(airlines)
}

/// Merges listings by ICAO. The first occurrence of an ICAO wins, so the
/// first listing keeps all of its rows and later ones only add new codes.
pub fn merge_listings(listings: Vec<(String, Vec<Airline>)>) -> MergedCatalog {
    let mut seen = HashSet::new();
    let mut airlines = Vec::new();
    let mut stats = Vec::with_capacity(listings.len());

    for (label, listing) in listings {
        let mut unique = HashSet::new();
        let mut contributed = 0usize;
        for airline in listing {
            if !unique.insert(airline.icao().clone()) {
                continue;
            }
            if seen.insert(airline.icao().clone()) {
                contributed += 1;
                airlines.push(airline);
            }
        }
        stats.push(ListingStats {
            label,
            unique: unique.len(),
            contributed,
            overlap: unique.len() - contributed,
        });
    }

    let combined = airlines.len();
    MergedCatalog {
        airlines,
        stats: CatalogStats {
            listings: stats,
            combined,
        },
    }
}
