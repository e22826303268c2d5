use assert_matches::assert_matches;

use airline_logos::domain::{Airline, Fr24Method, IataCode, IcaoCode};
use airline_logos::error::LogoError;
use airline_logos::sources::SourceKind;

#[test]
fn icao_codes_are_normalized() {
    let code: IcaoCode = " baw ".parse().unwrap();
    assert_eq!(code.as_str(), "BAW");
    assert_matches!("BA".parse::<IcaoCode>(), Err(LogoError::InvalidIcao(_)));
    assert_matches!("BAWX".parse::<IcaoCode>(), Err(LogoError::InvalidIcao(_)));
    assert_matches!("B-W".parse::<IcaoCode>(), Err(LogoError::InvalidIcao(_)));
}

#[test]
fn iata_codes_accept_two_or_three_characters() {
    assert_eq!("u2".parse::<IataCode>().unwrap().as_str(), "U2");
    assert!("A".parse::<IataCode>().is_err());
}

#[test]
fn airline_file_name_uses_icao() {
    let airline = Airline::from_codes(Some("BA"), "baw").unwrap();
    assert_eq!(airline.file_name(), "BAW.png");
    assert_eq!(airline.to_string(), "BA/BAW");

    let no_iata = Airline::from_codes(Some("  "), "EZY").unwrap();
    assert!(no_iata.iata().is_none());
    assert_eq!(no_iata.to_string(), "EZY");
}

#[test]
fn airlines_sort_by_icao() {
    let mut airlines = vec![
        Airline::from_codes(None, "UAL").unwrap(),
        Airline::from_codes(None, "AAL").unwrap(),
        Airline::from_codes(None, "DLH").unwrap(),
    ];
    airlines.sort_by(|a, b| a.icao().cmp(b.icao()));
    let codes: Vec<&str> = airlines.iter().map(|a| a.icao().as_str()).collect();
    assert_eq!(codes, vec!["AAL", "DLH", "UAL"]);
}

#[test]
fn source_kinds_parse_from_directory_or_name() {
    assert_eq!(
        "radarbox_banners".parse::<SourceKind>().unwrap(),
        SourceKind::RadarBoxBanners
    );
    assert_eq!(
        "avcodes uk banners".parse::<SourceKind>().unwrap(),
        SourceKind::AvcodesBanners
    );
    assert_matches!("nope".parse::<SourceKind>(), Err(LogoError::UnknownSource(_)));
}

#[test]
fn fr24_method_defaults_to_scrape() {
    assert_eq!(Fr24Method::default(), Fr24Method::Scrape);
    assert_eq!(Fr24Method::Brute.to_string(), "brute");
}
