mod common;

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;

use airline_logos::acquire::AcquireOptions;
use airline_logos::app::App;
use airline_logos::domain::{Airline, Fr24Method};
use airline_logos::fr24::FR24_INDEX_URL;
use airline_logos::sources::{SourceKind, UrlRule};
use airline_logos::store::Store;

use common::{MockClient, RecordingReporter, airline, logo_image, png_bytes, temp_root};

const FR24_INDEX: &str = r#"
<table>
  <tr>
    <td>1</td>
    <td><img data-bn-lazy-src="https://images.test/fr24/BAW.png"></td>
    <td>British Airways</td>
    <td>BA / BAW</td>
  </tr>
</table>"#;

#[test]
fn fetch_end_to_end_keeps_real_logos_only() {
    let (_temp, root) = temp_root();
    let client = MockClient::default();
    client.respond("https://logos.test/fa/AAL.png", 200, png_bytes(&logo_image(64, 64)));
    client.respond("https://logos.test/fa/BAW.png", 200, png_bytes(&logo_image(1, 1)));

    let app = App::new(Store::new(&root), &client);
    let mut registry = app.build_registry(
        &[SourceKind::FlightAwareLogos],
        Fr24Method::Scrape,
        &Utf8PathBuf::from("unused.png"),
    );
    registry.set_url_rule(
        SourceKind::FlightAwareLogos,
        UrlRule::Template("https://logos.test/fa/{icao}.png".to_string()),
    );
    let reporter = Arc::new(RecordingReporter::default());
    let options = AcquireOptions {
        workers: 2,
        delay: Duration::ZERO,
        skip_existing: false,
    };
    let airlines = vec![
        Airline::from_codes(Some("AA"), "AAL").unwrap(),
        Airline::from_codes(Some("BA"), "BAW").unwrap(),
    ];

    let summary = app
        .fetch(airlines, registry, options, reporter.clone())
        .unwrap();

    assert!(root.join("flightaware_logos/AAL.png").as_std_path().is_file());
    assert!(!root.join("flightaware_logos/BAW.png").as_std_path().exists());
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.sources.len(), 1);
    assert_eq!(summary.sources[0].label, "FA");
    assert_eq!(summary.sources[0].new, 1);
    assert_eq!(summary.files[0].directory, "flightaware_logos");
    assert_eq!(summary.files[0].files, 1);

    let saved = image::open(root.join("flightaware_logos/AAL.png").as_std_path()).unwrap();
    assert_eq!((saved.width(), saved.height()), (64, 64));

    assert_eq!(
        reporter.lines(),
        vec!["Downloaded AAL from FlightAware Logos".to_string()]
    );
    assert_eq!(reporter.redraws.lock().unwrap().len(), 2);
    // FR24 was never enabled, so the index was not scraped.
    assert_eq!(client.total_calls(), 2);
}

#[test]
fn scrape_strategy_resolves_fr24_urls_from_the_index() {
    let client = MockClient::default();
    client.respond(FR24_INDEX_URL, 200, FR24_INDEX.as_bytes().to_vec());
    let app = App::new(Store::new("."), &client);

    let registry = app.build_registry(
        &[SourceKind::Fr24Logos],
        Fr24Method::Scrape,
        &Utf8PathBuf::from("unused.png"),
    );
    let fr24 = registry.enabled().next().unwrap();
    assert_eq!(
        fr24.url_for(&airline("BAW")).as_deref(),
        Some("https://images.test/fr24/BAW.png")
    );
    assert_eq!(fr24.url_for(&airline("AAL")), None);
    assert_eq!(client.calls(FR24_INDEX_URL), 1);
}

#[test]
fn brute_strategy_skips_the_index() {
    let client = MockClient::default();
    let app = App::new(Store::new("."), &client);

    let registry = app.build_registry(
        &[SourceKind::Fr24Logos],
        Fr24Method::Brute,
        &Utf8PathBuf::from("unused.png"),
    );
    let fr24 = registry.enabled().next().unwrap();
    let baw = Airline::from_codes(Some("BA"), "BAW").unwrap();
    assert!(fr24.url_for(&baw).unwrap().ends_with("/BA_BAW.png"));
    assert_eq!(client.total_calls(), 0);
}

#[test]
fn failed_index_download_disables_fr24_lookups() {
    let client = MockClient::default();
    client.respond(FR24_INDEX_URL, 503, Vec::new());
    let app = App::new(Store::new("."), &client);

    let registry = app.build_registry(
        &[SourceKind::Fr24Logos],
        Fr24Method::Scrape,
        &Utf8PathBuf::from("unused.png"),
    );
    let fr24 = registry.enabled().next().unwrap();
    assert_eq!(fr24.url_for(&airline("BAW")), None);
}

#[test]
fn radarbox_placeholder_is_loaded_when_present() {
    let (_temp, root) = temp_root();
    let placeholder = root.join("placeholder.png");
    std::fs::write(&placeholder, png_bytes(&logo_image(30, 30))).unwrap();
    let client = MockClient::default();
    let app = App::new(Store::new(&root), &client);

    let with = app.build_registry(&[SourceKind::RadarBoxLogos], Fr24Method::Scrape, &placeholder);
    assert!(with.enabled().next().unwrap().placeholder.is_some());

    let without = app.build_registry(
        &[SourceKind::RadarBoxLogos],
        Fr24Method::Scrape,
        &root.join("missing.png"),
    );
    assert!(without.enabled().next().unwrap().placeholder.is_none());
}

#[test]
fn sync_and_audit_run_through_the_app() {
    let (_temp, root) = temp_root();
    let local = root.join("local");
    let repo = root.join("repo");
    std::fs::create_dir_all(local.join("avcodes_banners")).unwrap();
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::write(
        local.join("avcodes_banners/AAL.png"),
        png_bytes(&logo_image(8, 8)),
    )
    .unwrap();

    let client = MockClient::default();
    let app = App::new(Store::new(&local), &client);

    let dry = app.sync(&repo, true).unwrap();
    assert_eq!(dry.stats.added, 1);
    let before = app.audit(&repo, &[airline("AAL")]).unwrap();
    assert_eq!(before.totals.new, 1);

    app.sync(&repo, false).unwrap();
    let after = app.audit(&repo, &[airline("AAL")]).unwrap();
    assert_eq!(after.totals.new, 0);
    assert_eq!(after.totals.repo, 1);
    assert_eq!(client.total_calls(), 0);
}
