use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::IcaoCode;
use crate::http::LogoClient;

pub const FR24_INDEX_URL: &str = "https://www.flightradar24.com/data/airlines/";

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("static regex"));
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").expect("static regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static LAZY_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img[^>]*\bdata-bn-lazy-src\s*=\s*["']([^"']+)["']"#).expect("static regex")
});

/// Downloads the FR24 airline index and maps ICAO codes to logo URLs.
/// Any failure yields an empty map; FR24 is then simply skipped.
pub fn fetch_logo_map<C: LogoClient + ?Sized>(client: &C) -> HashMap<IcaoCode, String> {
    tracing::info!("scraping {FR24_INDEX_URL} for logo map");
    let map = match client.get_page(FR24_INDEX_URL) {
        Ok(response) if response.is_success() => {
            parse_logo_map(&String::from_utf8_lossy(&response.body))
        }
        Ok(response) => {
            tracing::warn!("failed to fetch FR24 index: status {}", response.status);
            HashMap::new()
        }
        Err(err) => {
            tracing::warn!("failed to fetch FR24 index: {err}");
            HashMap::new()
        }
    };
    tracing::info!("found {} airlines with logos in the FR24 index", map.len());
    map
}

/// Rows carry the logo `<img>` in the second cell and the codes
/// (`"2I / CSB"`, `"EMC"`, `"- / ICAO"`) in the fourth.
pub fn parse_logo_map(html: &str) -> HashMap<IcaoCode, String> {
    let mut map = HashMap::new();
    for row in ROW_RE.captures_iter(html) {
        let cells: Vec<&str> = CELL_RE
            .captures_iter(&row[1])
            .filter_map(|cell| cell.get(1).map(|m| m.as_str()))
            .collect();
        if cells.len() < 4 {
            continue;
        }

        let codes = TAG_RE.replace_all(cells[3], "");
        let Some(icao) = codes
            .split('/')
            .map(str::trim)
            .find(|part| part.len() == 3)
            .and_then(|part| part.parse::<IcaoCode>().ok())
        else {
            continue;
        };

        if let Some(src) = LAZY_SRC_RE.captures(cells[1]) {
            map.insert(icao, absolute_url(&src[1]));
        }
    }
    map
}

fn absolute_url(src: &str) -> String {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        src.to_string()
    }
}
