use std::cell::OnceCell;
use std::fs::{self, File};
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use image::DynamicImage;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::LogoError;
use crate::store::Store;
use crate::validate::images_are_same;

/// Local source directory → directory in the published repository.
pub const DEFAULT_SYNC_MAP: [(&str, &str); 5] = [
    ("flightaware_logos", "flightaware_logos"),
    ("radarbox_banners", "radarbox_banners"),
    ("radarbox_logos", "radarbox_logos"),
    ("fr24_logos", "fr24_banners"),
    ("avcodes_banners", "avcodes_banners"),
];

pub fn default_sync_map() -> Vec<(String, String)> {
    DEFAULT_SYNC_MAP
        .iter()
        .map(|(source, target)| (source.to_string(), target.to_string()))
        .collect()
}

/// A file whose content hash is computed on first use.
#[derive(Debug)]
pub struct FileRecord {
    pub name: String,
    pub path: Utf8PathBuf,
    hash: OnceCell<Result<String, String>>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, path: Utf8PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            hash: OnceCell::new(),
        }
    }

    pub fn content_hash(&self) -> Result<&str, LogoError> {
        self.hash
            .get_or_init(|| hash_file(&self.path).map_err(|err| err.to_string()))
            .as_deref()
            .map_err(|err| LogoError::Filesystem(err.clone()))
    }

    pub fn size(&self) -> u64 {
        fs::metadata(self.path.as_std_path())
            .map(|meta| meta.len())
            .unwrap_or(0)
    }

    fn decode(&self) -> Result<DynamicImage, LogoError> {
        image::open(self.path.as_std_path()).map_err(|err| LogoError::ImageDecode(err.to_string()))
    }
}

pub fn hash_file(path: &Utf8Path) -> Result<String, LogoError> {
    let mut file = File::open(path.as_std_path())
        .map_err(|err| LogoError::Filesystem(format!("open {path}: {err}")))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 4096];
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|err| LogoError::Filesystem(format!("read {path}: {err}")))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum FileClass {
    Added,
    Updated { size_delta: i64 },
    Skipped,
    Error { reason: String },
}

/// Classifies a source file against its counterpart in the target tree.
/// Differing bytes only count as an update when the pixels differ too.
pub fn classify(source: &FileRecord, target: Option<&FileRecord>) -> FileClass {
    let source_hash = match source.content_hash() {
        Ok(hash) => hash,
        Err(err) => {
            return FileClass::Error {
                reason: err.to_string(),
            };
        }
    };
    let Some(target) = target else {
        return FileClass::Added;
    };
    if target.content_hash().ok() == Some(source_hash) {
        return FileClass::Skipped;
    }

    let source_image = match source.decode() {
        Ok(image) => image,
        Err(err) => {
            return FileClass::Error {
                reason: err.to_string(),
            };
        }
    };
    // An unreadable target is replaced.
    if let Ok(target_image) = target.decode() {
        if images_are_same(&source_image, &target_image) {
            return FileClass::Skipped;
        }
    }
    FileClass::Updated {
        size_delta: source.size() as i64 - target.size() as i64,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncStats {
    fn count(&mut self, class: &FileClass) {
        match class {
            FileClass::Added => self.added += 1,
            FileClass::Updated { .. } => self.updated += 1,
            FileClass::Skipped => self.skipped += 1,
            FileClass::Error { .. } => self.errors += 1,
        }
    }

    fn absorb(&mut self, other: &SyncStats) {
        self.added += other.added;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PairStatus {
    Synced,
    SourceMissing,
    TargetCreated,
    /// Dry run over a target directory that does not exist yet.
    TargetWouldBeCreated,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    pub name: String,
    #[serde(flatten)]
    pub class: FileClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub source: String,
    pub target: String,
    pub status: PairStatus,
    /// Added, updated and failed files; skipped ones are only counted.
    pub changes: Vec<FileChange>,
    /// Files present in the target but not in the source.
    pub gaps: Vec<String>,
    pub stats: SyncStats,
}

impl PairReport {
    fn new(source: &str, target: &str, status: PairStatus) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            status,
            changes: Vec::new(),
            gaps: Vec::new(),
            stats: SyncStats::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub source_root: String,
    pub target_root: String,
    pub dry_run: bool,
    pub pairs: Vec<PairReport>,
    pub stats: SyncStats,
}

pub struct Reconciler {
    source: Store,
    target: Store,
    mapping: Vec<(String, String)>,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(source: Store, target: Store, dry_run: bool) -> Self {
        Self {
            source,
            target,
            mapping: default_sync_map(),
            dry_run,
        }
    }

    pub fn with_mapping(mut self, mapping: Vec<(String, String)>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn run(&self) -> Result<SyncReport, LogoError> {
        if !self.source.exists() {
            return Err(LogoError::SourceMissing(
                self.source.root().as_std_path().to_path_buf(),
            ));
        }
        if !self.target.exists() {
            return Err(LogoError::TargetMissing(
                self.target.root().as_std_path().to_path_buf(),
            ));
        }

        let mut stats = SyncStats::default();
        let mut pairs = Vec::with_capacity(self.mapping.len());
        for (source_dir, target_dir) in &self.mapping {
            let pair = self.sync_pair(source_dir, target_dir);
            stats.absorb(&pair.stats);
            pairs.push(pair);
        }

        Ok(SyncReport {
            source_root: self.source.root().to_string(),
            target_root: self.target.root().to_string(),
            dry_run: self.dry_run,
            pairs,
            stats,
        })
    }

    fn sync_pair(&self, source_name: &str, target_name: &str) -> PairReport {
        let source_dir = self.source.dir(source_name);
        let target_dir = self.target.dir(target_name);

        if !source_dir.as_std_path().is_dir() {
            return PairReport::new(source_name, target_name, PairStatus::SourceMissing);
        }

        let mut status = PairStatus::Synced;
        if !target_dir.as_std_path().is_dir() {
            if self.dry_run {
                status = PairStatus::TargetWouldBeCreated;
            } else {
                match self.target.ensure_dir(target_name) {
                    Ok(_) => status = PairStatus::TargetCreated,
                    Err(err) => {
                        let mut report =
                            PairReport::new(source_name, target_name, PairStatus::Failed(err.to_string()));
                        report.stats.errors += 1;
                        return report;
                    }
                }
            }
        }

        let mut report = PairReport::new(source_name, target_name, status);
        let listing = Store::list_pngs(&source_dir)
            .and_then(|source| Store::list_pngs(&target_dir).map(|target| (source, target)));
        let (source_files, target_files) = match listing {
            Ok(listing) => listing,
            Err(err) => {
                report.status = PairStatus::Failed(err.to_string());
                report.stats.errors += 1;
                return report;
            }
        };

        for name in &source_files {
            let source = FileRecord::new(name.as_str(), source_dir.join(name));
            let target_path = target_dir.join(name);
            let target = target_path
                .as_std_path()
                .is_file()
                .then(|| FileRecord::new(name.as_str(), target_path.clone()));

            let mut class = classify(&source, target.as_ref());
            if matches!(class, FileClass::Added | FileClass::Updated { .. }) && !self.dry_run {
                if let Err(err) = Store::copy_file_atomic(&source.path, &target_path) {
                    class = FileClass::Error {
                        reason: err.to_string(),
                    };
                }
            }

            report.stats.count(&class);
            if class != FileClass::Skipped {
                report.changes.push(FileChange {
                    name: name.clone(),
                    class,
                });
            }
        }

        report.gaps = target_files.difference(&source_files).cloned().collect();
        report
    }
}
