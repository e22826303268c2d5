use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::domain::{Airline, IcaoCode};
use crate::error::LogoError;
use crate::reconcile::DEFAULT_SYNC_MAP;
use crate::sources::SourceKind;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditCounts {
    pub local: usize,
    pub repo: usize,
    pub net: i64,
    /// Local only; would be added by a sync.
    pub new: usize,
    /// Repo only; missed by this run.
    pub gap: usize,
    /// Repo files for ICAOs not in the catalog.
    pub legacy: usize,
    /// Catalog ICAOs with no local file. Diagnostic only: no provider has
    /// every airline.
    pub fail: usize,
}

impl AuditCounts {
    fn absorb(&mut self, other: &AuditCounts) {
        self.local += other.local;
        self.repo += other.repo;
        self.net += other.net;
        self.new += other.new;
        self.gap += other.gap;
        self.legacy += other.legacy;
        self.fail += other.fail;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderAudit {
    pub provider: String,
    pub local_dir: String,
    pub repo_dir: String,
    pub counts: AuditCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub catalog_size: usize,
    pub providers: Vec<ProviderAudit>,
    pub totals: AuditCounts,
}

/// Provider name, local directory, repository directory.
pub fn default_providers() -> Vec<(String, String, String)> {
    SourceKind::ALL
        .iter()
        .map(|kind| {
            let local = kind.directory();
            let repo = DEFAULT_SYNC_MAP
                .iter()
                .find(|(source, _)| *source == local)
                .map(|(_, target)| *target)
                .unwrap_or(local);
            (kind.display_name().to_string(), local.to_string(), repo.to_string())
        })
        .collect()
}

pub fn audit(
    local: &Store,
    repo: &Store,
    catalog: &[Airline],
    providers: &[(String, String, String)],
) -> Result<AuditReport, LogoError> {
    if !repo.exists() {
        return Err(LogoError::TargetMissing(repo.root().as_std_path().to_path_buf()));
    }

    let catalog_icaos: HashSet<&IcaoCode> = catalog.iter().map(Airline::icao).collect();
    let mut totals = AuditCounts::default();
    let mut audits = Vec::with_capacity(providers.len());

    for (provider, local_dir, repo_dir) in providers {
        let local_files = Store::list_pngs(&local.dir(local_dir))?;
        let repo_files = Store::list_pngs(&repo.dir(repo_dir))?;
        let counts = compare(&local_files, &repo_files, &catalog_icaos);
        totals.absorb(&counts);
        audits.push(ProviderAudit {
            provider: provider.clone(),
            local_dir: local_dir.clone(),
            repo_dir: repo_dir.clone(),
            counts,
        });
    }

    Ok(AuditReport {
        catalog_size: catalog_icaos.len(),
        providers: audits,
        totals,
    })
}

fn compare(
    local: &BTreeSet<String>,
    repo: &BTreeSet<String>,
    catalog: &HashSet<&IcaoCode>,
) -> AuditCounts {
    let legacy = repo
        .iter()
        .filter(|name| {
            stem(name)
                .parse::<IcaoCode>()
                .map(|icao| !catalog.contains(&icao))
                .unwrap_or(true)
        })
        .count();

    let local_stems: HashSet<String> = local.iter().map(|name| stem(name).to_string()).collect();
    let fail = catalog
        .iter()
        .filter(|icao| !local_stems.contains(icao.as_str()))
        .count();

    AuditCounts {
        local: local.len(),
        repo: repo.len(),
        net: local.len() as i64 - repo.len() as i64,
        new: local.difference(repo).count(),
        gap: repo.difference(local).count(),
        legacy,
        fail,
    }
}

fn stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn compare_counts_every_column() {
        let aal: IcaoCode = "AAL".parse().unwrap();
        let baw: IcaoCode = "BAW".parse().unwrap();
        let dlh: IcaoCode = "DLH".parse().unwrap();
        let catalog: HashSet<&IcaoCode> = [&aal, &baw, &dlh].into_iter().collect();

        let local = names(&["AAL.png", "BAW.PNG"]);
        let repo = names(&["AAL.png", "OLD.png"]);
        let counts = compare(&local, &repo, &catalog);

        assert_eq!(
            counts,
            AuditCounts {
                local: 2,
                repo: 2,
                net: 0,
                new: 1,
                gap: 1,
                legacy: 1,
                fail: 1,
            }
        );
    }

    #[test]
    fn fr24_maps_to_banner_directory() {
        let providers = default_providers();
        let fr24 = providers
            .iter()
            .find(|(_, local, _)| local == "fr24_logos")
            .unwrap();
        assert_eq!(fr24.2, "fr24_banners");
    }
}
