use std::fs;

use assert_matches::assert_matches;
use camino::Utf8Path;

use airline_logos::audit::{audit, default_providers};
use airline_logos::domain::Airline;
use airline_logos::error::LogoError;
use airline_logos::store::Store;

fn touch(root: &Utf8Path, dir: &str, name: &str) {
    fs::create_dir_all(root.join(dir)).unwrap();
    fs::write(root.join(dir).join(name), b"png").unwrap();
}

fn root(temp: &tempfile::TempDir) -> camino::Utf8PathBuf {
    camino::Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
}

#[test]
fn audit_compares_every_provider() {
    let local_temp = tempfile::tempdir().unwrap();
    let repo_temp = tempfile::tempdir().unwrap();
    let local = root(&local_temp);
    let repo = root(&repo_temp);

    touch(&local, "flightaware_logos", "AAL.png");
    touch(&local, "flightaware_logos", "BAW.png");
    touch(&repo, "flightaware_logos", "AAL.png");
    touch(&repo, "flightaware_logos", "PAA.png");
    touch(&local, "fr24_logos", "DLH.png");
    touch(&repo, "fr24_banners", "DLH.png");

    let catalog: Vec<Airline> = ["AAL", "BAW", "DLH"]
        .iter()
        .map(|code| Airline::from_codes(None, code).unwrap())
        .collect();

    let report = audit(
        &Store::new(&local),
        &Store::new(&repo),
        &catalog,
        &default_providers(),
    )
    .unwrap();

    assert_eq!(report.catalog_size, 3);
    assert_eq!(report.providers.len(), 5);

    let fa = &report.providers[0];
    assert_eq!(fa.provider, "FlightAware Logos");
    assert_eq!(fa.counts.local, 2);
    assert_eq!(fa.counts.repo, 2);
    assert_eq!(fa.counts.new, 1);
    assert_eq!(fa.counts.gap, 1);
    assert_eq!(fa.counts.legacy, 1);
    assert_eq!(fa.counts.fail, 1);

    let fr24 = report
        .providers
        .iter()
        .find(|p| p.local_dir == "fr24_logos")
        .unwrap();
    assert_eq!(fr24.repo_dir, "fr24_banners");
    assert_eq!(fr24.counts.new, 0);
    assert_eq!(fr24.counts.gap, 0);

    assert_eq!(report.totals.local, 3);
    assert_eq!(report.totals.repo, 3);
    // Two providers with files, three empty ones that miss every airline.
    assert_eq!(report.totals.fail, 1 + 2 + 3 * 3);
}

#[test]
fn audit_requires_the_repository() {
    let local_temp = tempfile::tempdir().unwrap();
    let local = root(&local_temp);
    let missing = local.join("airline-logos");

    assert_matches!(
        audit(&Store::new(&local), &Store::new(&missing), &[], &default_providers()),
        Err(LogoError::TargetMissing(_))
    );
}
