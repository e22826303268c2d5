use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use image::DynamicImage;

use crate::domain::{Airline, IcaoCode};
use crate::error::LogoError;

pub const FLIGHTAWARE_LOGO_URL: &str =
    "https://flightaware.com/images/airline_logos/90p/{icao}.png";
pub const RADARBOX_BANNER_URL: &str = "https://cdn.radarbox.com/airlines/{icao}.png";
pub const RADARBOX_LOGO_URL: &str = "https://cdn.radarbox.com/airlines/sq/{icao}.png";
pub const FR24_LOGO_URL: &str =
    "https://cdn.flightradar24.com/assets/airlines/logotypes/{iata}_{icao}.png";
pub const AVCODES_BANNER_URL: &str = "https://www.avcodes.co.uk/images/logos/{icao}.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    FlightAwareLogos,
    RadarBoxBanners,
    RadarBoxLogos,
    Fr24Logos,
    AvcodesBanners,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::FlightAwareLogos,
        SourceKind::RadarBoxBanners,
        SourceKind::RadarBoxLogos,
        SourceKind::Fr24Logos,
        SourceKind::AvcodesBanners,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::FlightAwareLogos => "FlightAware Logos",
            SourceKind::RadarBoxBanners => "RadarBox Banners",
            SourceKind::RadarBoxLogos => "RadarBox Logos",
            SourceKind::Fr24Logos => "FlightRadar24 Logos",
            SourceKind::AvcodesBanners => "Avcodes UK Banners",
        }
    }

    /// Footer label; the footer has to fit five sources on one line.
    pub fn short_label(self) -> &'static str {
        match self {
            SourceKind::FlightAwareLogos => "FA",
            SourceKind::RadarBoxBanners => "RB Ban",
            SourceKind::RadarBoxLogos => "RB Log",
            SourceKind::Fr24Logos => "FR24",
            SourceKind::AvcodesBanners => "Av",
        }
    }

    pub fn directory(self) -> &'static str {
        match self {
            SourceKind::FlightAwareLogos => "flightaware_logos",
            SourceKind::RadarBoxBanners => "radarbox_banners",
            SourceKind::RadarBoxLogos => "radarbox_logos",
            SourceKind::Fr24Logos => "fr24_logos",
            SourceKind::AvcodesBanners => "avcodes_banners",
        }
    }

    fn url_template(self) -> &'static str {
        match self {
            SourceKind::FlightAwareLogos => FLIGHTAWARE_LOGO_URL,
            SourceKind::RadarBoxBanners => RADARBOX_BANNER_URL,
            SourceKind::RadarBoxLogos => RADARBOX_LOGO_URL,
            SourceKind::Fr24Logos => FR24_LOGO_URL,
            SourceKind::AvcodesBanners => AVCODES_BANNER_URL,
        }
    }

    /// Status codes the source uses for "no logo". FR24 answers 403.
    fn missing_statuses(self) -> Vec<u16> {
        match self {
            SourceKind::Fr24Logos => vec![404, 403],
            _ => vec![404],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SourceKind {
    type Err = LogoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        SourceKind::ALL
            .into_iter()
            .find(|kind| {
                kind.directory().eq_ignore_ascii_case(needle)
                    || kind.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| LogoError::UnknownSource(value.to_string()))
    }
}

/// How a source turns an airline into a download URL.
#[derive(Debug, Clone)]
pub enum UrlRule {
    /// `{icao}` and `{iata}` placeholders. Templates using `{iata}` yield no
    /// URL for airlines without an IATA code.
    Template(String),
    /// Pre-resolved URLs keyed by ICAO; airlines not in the map are skipped.
    Lookup(Arc<HashMap<IcaoCode, String>>),
}

impl UrlRule {
    pub fn url_for(&self, airline: &Airline) -> Option<String> {
        match self {
            UrlRule::Template(template) => {
                let mut url = template.replace("{icao}", airline.icao().as_str());
                if url.contains("{iata}") {
                    url = url.replace("{iata}", airline.iata()?.as_str());
                }
                Some(url)
            }
            UrlRule::Lookup(map) => map.get(airline.icao()).cloned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub label: String,
    pub directory: Utf8PathBuf,
    pub enabled: bool,
    pub url: UrlRule,
    pub missing_statuses: Vec<u16>,
    pub placeholder: Option<Arc<DynamicImage>>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, directory: impl Into<Utf8PathBuf>, url: UrlRule) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            directory: directory.into(),
            enabled: true,
            url,
            missing_statuses: vec![404],
            placeholder: None,
        }
    }

    pub fn builtin(kind: SourceKind) -> Self {
        Self {
            name: kind.display_name().to_string(),
            label: kind.short_label().to_string(),
            directory: Utf8PathBuf::from(kind.directory()),
            enabled: false,
            url: UrlRule::Template(kind.url_template().to_string()),
            missing_statuses: kind.missing_statuses(),
            placeholder: None,
        }
    }

    pub fn url_for(&self, airline: &Airline) -> Option<String> {
        self.url.url_for(airline)
    }

    pub fn file_path(&self, root: &Utf8Path, airline: &Airline) -> Utf8PathBuf {
        root.join(&self.directory).join(airline.file_name())
    }

    pub fn is_missing_status(&self, status: u16) -> bool {
        self.missing_statuses.contains(&status)
    }
}

/// The source table for one run. Order is the order sources are tried for
/// each airline and the order they appear in reports.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    entries: Vec<(SourceKind, SourceDescriptor)>,
}

impl SourceRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: SourceKind::ALL
                .into_iter()
                .map(|kind| (kind, SourceDescriptor::builtin(kind)))
                .collect(),
        }
    }

    pub fn get_mut(&mut self, kind: SourceKind) -> Option<&mut SourceDescriptor> {
        self.entries
            .iter_mut()
            .find(|(entry_kind, _)| *entry_kind == kind)
            .map(|(_, desc)| desc)
    }

    pub fn set_enabled(&mut self, kind: SourceKind, enabled: bool) {
        if let Some(desc) = self.get_mut(kind) {
            desc.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        self.entries
            .iter()
            .any(|(entry_kind, desc)| *entry_kind == kind && desc.enabled)
    }

    pub fn set_url_rule(&mut self, kind: SourceKind, rule: UrlRule) {
        if let Some(desc) = self.get_mut(kind) {
            desc.url = rule;
        }
    }

    pub fn set_placeholder(&mut self, kind: SourceKind, image: DynamicImage) {
        if let Some(desc) = self.get_mut(kind) {
            desc.placeholder = Some(Arc::new(image));
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.entries.iter().map(|(_, desc)| desc)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.all().filter(|desc| desc.enabled)
    }

    pub fn into_descriptors(self) -> Vec<SourceDescriptor> {
        self.entries.into_iter().map(|(_, desc)| desc).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_requires_iata_when_referenced() {
        let fr24 = SourceDescriptor::builtin(SourceKind::Fr24Logos);
        let without = Airline::from_codes(None, "ABC").unwrap();
        let with = Airline::from_codes(Some("AA"), "AAL").unwrap();
        assert_eq!(fr24.url_for(&without), None);
        assert_eq!(
            fr24.url_for(&with).unwrap(),
            "https://cdn.flightradar24.com/assets/airlines/logotypes/AA_AAL.png"
        );
    }

    #[test]
    fn parse_kind_by_directory_or_name() {
        assert_eq!(
            "fr24_logos".parse::<SourceKind>().unwrap(),
            SourceKind::Fr24Logos
        );
        assert_eq!(
            "radarbox logos".parse::<SourceKind>().unwrap(),
            SourceKind::RadarBoxLogos
        );
        assert!("bing".parse::<SourceKind>().is_err());
    }

    #[test]
    fn fr24_treats_forbidden_as_missing() {
        let fr24 = SourceDescriptor::builtin(SourceKind::Fr24Logos);
        let fa = SourceDescriptor::builtin(SourceKind::FlightAwareLogos);
        assert!(fr24.is_missing_status(403));
        assert!(!fa.is_missing_status(403));
        assert!(fa.is_missing_status(404));
    }
}
