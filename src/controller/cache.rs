use crate::analysis::aggregate;
use crate::analysis::scanner::{EnvironmentScanner, WalkMode};
use crate::models::snapshot::{Library, Snapshot};
use std::path::Path;
use std::sync::Arc;

/// Single-slot holder for the most recent snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: Option<Arc<Snapshot>>,
}

impl SnapshotCache {
    /// Replace the cached snapshot wholesale.
    pub fn set(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Where a drill-down target came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillDownHit {
    Cached(Library),
    Scanned(Library),
}

impl DrillDownHit {
    pub fn library(&self) -> &Library {
        match self {
            DrillDownHit::Cached(library) | DrillDownHit::Scanned(library) => library,
        }
    }

    pub fn into_library(self) -> Library {
        match self {
            DrillDownHit::Cached(library) | DrillDownHit::Scanned(library) => library,
        }
    }
}

/// Look a library up in the cached snapshot, falling back to the
/// environment scanner. `None` means there is nothing to show.
pub fn lookup_library(
    snapshot: Option<&Snapshot>,
    library_name: &str,
    scanner: &EnvironmentScanner,
) -> Option<DrillDownHit> {
    if let Some(library) = snapshot.and_then(|s| s.find_library(library_name)) {
        return Some(DrillDownHit::Cached(with_loaded_classes(library, scanner)));
    }

    let scan = scanner.lookup(library_name)?;
    log::debug!(
        "Drill-down for {} resolved through environment at {}",
        library_name,
        scan.root.display()
    );
    Some(DrillDownHit::Scanned(aggregate::library_from_scan(&scan)))
}

/// Cached libraries may arrive without classes; materialize them from the
/// library path when it is a readable directory.
fn with_loaded_classes(library: &Library, scanner: &EnvironmentScanner) -> Library {
    let mut library = library.clone();
    if !library.classes.is_empty() {
        return library;
    }

    let root = Path::new(&library.path);
    if root.is_dir() {
        library.classes = scanner
            .walk(root, WalkMode::StopAtCap)
            .files
            .iter()
            .map(|path| aggregate::class_from_file(path))
            .collect();
    }
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample::sample_snapshot;
    use crate::analysis::scanner::ScannerSettings;
    use std::fs;

    fn scanner(vars: Vec<(String, String)>) -> EnvironmentScanner {
        EnvironmentScanner::new(&ScannerSettings::default())
            .unwrap()
            .with_vars(vars)
    }

    #[test]
    fn set_replaces_wholesale() {
        let mut cache = SnapshotCache::default();
        assert!(cache.is_empty());

        let first = cache.set(sample_snapshot());
        let mut replacement = sample_snapshot();
        replacement.name = "Replacement".to_string();
        cache.set(replacement);

        assert_eq!(first.name, "Sample Universe");
        assert_eq!(cache.get().unwrap().name, "Replacement");

        cache.clear();
        assert!(cache.get().is_none());
    }

    #[test]
    fn lookup_hits_cache_case_insensitively() {
        let snapshot = sample_snapshot();
        let scanner = scanner(Vec::new());

        let exact = lookup_library(Some(&snapshot), "simple_json", &scanner).unwrap();
        let upper = lookup_library(Some(&snapshot), "SIMPLE_JSON", &scanner).unwrap();

        assert!(matches!(exact, DrillDownHit::Cached(_)));
        assert_eq!(exact, upper);
    }

    #[test]
    fn lookup_falls_back_to_environment() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("json_parser.e"), "class JSON_PARSER end").unwrap();
        let scanner = scanner(vec![(
            "SIMPLE_JSON".to_string(),
            tmp.path().to_string_lossy().to_string(),
        )]);

        let hit = lookup_library(None, "simple-json", &scanner).unwrap();
        let DrillDownHit::Scanned(library) = hit else {
            panic!("expected environment hit");
        };
        assert_eq!(library.score, 50);
        assert_eq!(library.classes.len(), 1);
        assert_eq!(library.classes[0].name, "JSON_PARSER");
        assert!(library.classes[0].has_invariant);
        assert_eq!(library.classes[0].feature_count, 5);
    }

    #[test]
    fn environment_drill_down_counts_files_beyond_class_cap() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..14 {
            fs::write(tmp.path().join(format!("class_{i:02}.e")), "class X end").unwrap();
        }
        let scanner = scanner(vec![(
            "SIMPLE_BIG".to_string(),
            tmp.path().to_string_lossy().to_string(),
        )]);

        let hit = lookup_library(None, "simple_big", &scanner).unwrap();
        let scanned = aggregate::from_scan(&scanner.scan());

        let library = hit.library();
        assert_eq!(library.classes.len(), 10);
        assert_eq!(library.feature_count, 70);
        assert_eq!(library.require_count, 28);
        assert_eq!(library.ensure_count, 28);
        assert_eq!(library.invariant_count, 9);
        assert_eq!(library.feature_count, scanned.libraries[0].feature_count);
    }

    #[test]
    fn lookup_miss_is_none() {
        let snapshot = sample_snapshot();
        assert!(lookup_library(Some(&snapshot), "simple_xml", &scanner(Vec::new())).is_none());
        assert!(lookup_library(None, "simple_json", &scanner(Vec::new())).is_none());
    }

    #[test]
    fn cached_library_without_classes_loads_them_from_its_path() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("http_client.e"), "class HTTP_CLIENT end").unwrap();

        let mut snapshot = sample_snapshot();
        snapshot.libraries[1].classes.clear();
        snapshot.libraries[1].path = tmp.path().to_string_lossy().to_string();

        let hit = lookup_library(Some(&snapshot), "simple_http", &scanner(Vec::new())).unwrap();
        assert_eq!(hit.library().classes.len(), 1);
        assert_eq!(hit.library().score, 78);
    }
}
