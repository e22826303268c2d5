use std::sync::Arc;

use camino::Utf8Path;

use crate::acquire::{AcquireOptions, AcquireSummary, Acquisition};
use crate::audit::{AuditReport, audit, default_providers};
use crate::domain::{Airline, Fr24Method};
use crate::error::LogoError;
use crate::fr24;
use crate::http::LogoClient;
use crate::progress::ProgressReporter;
use crate::reconcile::{Reconciler, SyncReport};
use crate::sources::{SourceKind, SourceRegistry, UrlRule};
use crate::store::Store;

/// Ties the local asset tree to a client. `store` is the tree the
/// acquisition writes into and the sync reads from.
#[derive(Clone)]
pub struct App<C: LogoClient> {
    store: Store,
    client: C,
}

impl<C: LogoClient> App<C> {
    pub fn new(store: Store, client: C) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The built-in source table with `enabled` switched on. The FR24 index
    /// is only scraped when FR24 is enabled with the scrape strategy.
    pub fn build_registry(
        &self,
        enabled: &[SourceKind],
        fr24_method: Fr24Method,
        radarbox_placeholder: &Utf8Path,
    ) -> SourceRegistry {
        let mut registry = SourceRegistry::builtin();
        for kind in enabled {
            registry.set_enabled(*kind, true);
        }

        if registry.is_enabled(SourceKind::Fr24Logos) && fr24_method == Fr24Method::Scrape {
            let map = fr24::fetch_logo_map(&self.client);
            registry.set_url_rule(SourceKind::Fr24Logos, UrlRule::Lookup(Arc::new(map)));
        }

        if registry.is_enabled(SourceKind::RadarBoxLogos) {
            match image::open(radarbox_placeholder.as_std_path()) {
                Ok(placeholder) => registry.set_placeholder(SourceKind::RadarBoxLogos, placeholder),
                Err(err) => tracing::warn!(
                    "placeholder {radarbox_placeholder} unavailable ({err}); RadarBox placeholders will be kept"
                ),
            }
        }

        registry
    }

    pub fn fetch(
        &self,
        airlines: Vec<Airline>,
        registry: SourceRegistry,
        options: AcquireOptions,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<AcquireSummary, LogoError> {
        let acquisition = Acquisition::new(
            &self.client,
            self.store.clone(),
            registry.into_descriptors(),
            options,
        );
        acquisition.run(airlines, reporter)
    }

    pub fn sync(&self, target: &Utf8Path, dry_run: bool) -> Result<SyncReport, LogoError> {
        Reconciler::new(self.store.clone(), Store::new(target), dry_run).run()
    }

    pub fn audit(&self, repo: &Utf8Path, catalog: &[Airline]) -> Result<AuditReport, LogoError> {
        audit(&self.store, &Store::new(repo), catalog, &default_providers())
    }
}
