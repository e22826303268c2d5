use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LogoError;

/// Three-letter ICAO airline designator. Unique key of an airline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IcaoCode(String);

impl IcaoCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IcaoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IcaoCode {
    type Err = LogoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid =
            normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(LogoError::InvalidIcao(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Two or three character IATA designator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IataCode(String);

impl IataCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IataCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IataCode {
    type Err = LogoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = (2..=3).contains(&normalized.len())
            && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(LogoError::InvalidIata(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// An airline as seen by the harvester. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Airline {
    iata: Option<IataCode>,
    icao: IcaoCode,
}

impl Airline {
    pub fn new(iata: Option<IataCode>, icao: IcaoCode) -> Self {
        Self { iata, icao }
    }

    /// Builds an airline from raw listing cells. An empty or malformed IATA
    /// cell is treated as absent; the ICAO cell must be valid.
    pub fn from_codes(iata: Option<&str>, icao: &str) -> Result<Self, LogoError> {
        let icao = icao.parse()?;
        let iata = iata
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok());
        Ok(Self { iata, icao })
    }

    pub fn iata(&self) -> Option<&IataCode> {
        self.iata.as_ref()
    }

    pub fn icao(&self) -> &IcaoCode {
        &self.icao
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.icao)
    }
}

impl fmt::Display for Airline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.iata {
            Some(iata) => write!(f, "{iata}/{}", self.icao),
            None => write!(f, "{}", self.icao),
        }
    }
}

/// How FlightRadar24 logo URLs are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Fr24Method {
    /// Parse the FR24 airline index for per-airline logo URLs.
    #[default]
    Scrape,
    /// Guess `{IATA}_{ICAO}.png` on the FR24 CDN.
    Brute,
}

impl fmt::Display for Fr24Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fr24Method::Scrape => write!(f, "scrape"),
            Fr24Method::Brute => write!(f, "brute"),
        }
    }
}
