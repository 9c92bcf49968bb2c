use crate::analysis::scanner::LibraryScan;
use crate::models::payload::{PayloadClass, PayloadLibrary, ProviderPayload};
use crate::models::snapshot::{clamp_score, Class, Library, Snapshot, SnapshotSource};
use std::collections::HashSet;
use std::path::Path;

/// Score assigned to everything the environment scanner derives.
pub const NEUTRAL_SCORE: u8 = 50;

const FEATURES_PER_FILE: u32 = 5;
const ASSERTIONS_PER_FILE: u32 = 2;
const INVARIANT_RATIO: f64 = 0.7;

/// Canonical snapshot from a primary-source payload.
///
/// Rollups are authoritative: the overall score and totals are copied from
/// the payload, never recomputed. A missing total falls back to the sum of
/// what the payload lists.
pub fn from_primary(payload: ProviderPayload) -> Snapshot {
    let libraries = dedupe_libraries(payload.libraries.into_iter().map(primary_library).collect());

    let listed_classes = saturating_total(libraries.iter().map(|l| l.classes.len() as u32));
    let summed = |field: fn(&Library) -> u32| saturating_total(libraries.iter().map(field));

    Snapshot {
        name: payload.name.unwrap_or_else(|| "Contract Universe".to_string()),
        score: clamp_score(payload.overall_score),
        library_count: payload.library_count.unwrap_or(libraries.len() as u32),
        class_count: payload.class_count.unwrap_or(listed_classes),
        total_features: payload.total_features.unwrap_or_else(|| summed(|l| l.feature_count)),
        total_requires: payload.total_requires.unwrap_or_else(|| summed(|l| l.require_count)),
        total_ensures: payload.total_ensures.unwrap_or_else(|| summed(|l| l.ensure_count)),
        total_invariants: payload
            .total_invariants
            .unwrap_or_else(|| summed(|l| l.invariant_count)),
        libraries,
        source: SnapshotSource::Primary,
        generated_at: chrono::Utc::now().timestamp(),
    }
}

/// Canonical snapshot from environment scan results.
///
/// Unlike [`from_primary`], the overall score is recomputed as the mean of
/// the library scores.
pub fn from_scan(scans: &[LibraryScan]) -> Snapshot {
    let libraries = dedupe_libraries(scans.iter().map(library_from_scan).collect());
    let file_total = saturating_total(scans.iter().map(|scan| count_u32(scan.file_count)));

    Snapshot {
        name: "Environment Libraries".to_string(),
        score: mean_score(&libraries),
        library_count: libraries.len() as u32,
        class_count: file_total,
        total_features: saturating_total(libraries.iter().map(|l| l.feature_count)),
        total_requires: saturating_total(libraries.iter().map(|l| l.require_count)),
        total_ensures: saturating_total(libraries.iter().map(|l| l.ensure_count)),
        total_invariants: saturating_total(libraries.iter().map(|l| l.invariant_count)),
        libraries,
        source: SnapshotSource::Environment,
        generated_at: chrono::Utc::now().timestamp(),
    }
}

/// Library with the fixed scanner heuristics applied to its file count.
pub fn library_from_scan(scan: &LibraryScan) -> Library {
    let files = count_u32(scan.file_count);

    Library {
        name: scan.name.clone(),
        path: scan.root.to_string_lossy().to_string(),
        score: NEUTRAL_SCORE,
        feature_count: files.saturating_mul(FEATURES_PER_FILE),
        require_count: files.saturating_mul(ASSERTIONS_PER_FILE),
        ensure_count: files.saturating_mul(ASSERTIONS_PER_FILE),
        invariant_count: (files as f64 * INVARIANT_RATIO).floor() as u32,
        classes: scan.files.iter().map(|path| class_from_file(path)).collect(),
    }
}

pub fn class_from_file(path: &Path) -> Class {
    Class {
        name: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_uppercase())
            .unwrap_or_default(),
        path: path.to_string_lossy().to_string(),
        line: 1,
        score: NEUTRAL_SCORE,
        feature_count: FEATURES_PER_FILE,
        require_count: ASSERTIONS_PER_FILE,
        ensure_count: ASSERTIONS_PER_FILE,
        has_invariant: true,
    }
}

/// Rounded arithmetic mean of library scores, 0 when there are none.
pub fn mean_score(libraries: &[Library]) -> u8 {
    if libraries.is_empty() {
        return 0;
    }
    let total: f64 = libraries.iter().map(|l| l.score as f64).sum();
    clamp_score(total / libraries.len() as f64)
}

/// Sum of counts, pinned at `u32::MAX` instead of wrapping.
fn saturating_total(counts: impl Iterator<Item = u32>) -> u32 {
    counts.fold(0u32, u32::saturating_add)
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Keep the first library for each case-insensitive name.
fn dedupe_libraries(libraries: Vec<Library>) -> Vec<Library> {
    let mut seen = HashSet::new();
    libraries
        .into_iter()
        .filter(|library| {
            let fresh = seen.insert(library.name.to_lowercase());
            if !fresh {
                log::warn!("Dropping duplicate library name: {}", library.name);
            }
            fresh
        })
        .collect()
}

fn primary_library(library: PayloadLibrary) -> Library {
    Library {
        name: library.name,
        path: library.path,
        score: clamp_score(library.score),
        feature_count: library.features,
        require_count: library.requires,
        ensure_count: library.ensures,
        invariant_count: library.invariants,
        classes: library.classes.into_iter().map(primary_class).collect(),
    }
}

fn primary_class(class: PayloadClass) -> Class {
    Class {
        name: class.name,
        path: class.path,
        line: class.line.max(1),
        score: clamp_score(class.score),
        feature_count: class.features,
        require_count: class.requires,
        ensure_count: class.ensures,
        has_invariant: class.has_invariant,
    }
}
