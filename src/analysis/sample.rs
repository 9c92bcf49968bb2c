use crate::models::snapshot::{Class, Library, Snapshot, SnapshotSource};

/// Built-in dataset shown when no real source produces data.
///
/// One library per color band so the whole ramp is visible.
pub fn sample_snapshot() -> Snapshot {
    let libraries = vec![
        library(
            "simple_json",
            92,
            [48, 40, 38, 5],
            &[("JSON_PARSER", 95, true), ("JSON_VALUE", 90, true), ("JSON_WRITER", 88, false)],
        ),
        library(
            "simple_http",
            78,
            [36, 24, 22, 3],
            &[("HTTP_CLIENT", 82, true), ("HTTP_REQUEST", 76, true), ("HTTP_RESPONSE", 74, false)],
        ),
        library(
            "simple_sql",
            61,
            [30, 16, 14, 2],
            &[("SQL_DATABASE", 66, true), ("SQL_RESULT", 55, false)],
        ),
        library(
            "simple_process",
            34,
            [22, 6, 5, 1],
            &[("PROCESS_RUNNER", 40, true), ("PROCESS_PIPE", 28, false)],
        ),
        library(
            "simple_logger",
            12,
            [15, 1, 1, 0],
            &[("LOGGER", 14, false), ("LOG_FORMAT", 9, false)],
        ),
        library("simple_legacy", 0, [9, 0, 0, 0], &[("LEGACY_API", 0, false)]),
    ];

    let class_count = libraries.iter().map(|l| l.classes.len() as u32).sum();

    Snapshot {
        name: "Sample Universe".to_string(),
        score: 56,
        library_count: libraries.len() as u32,
        class_count,
        total_features: libraries.iter().map(|l| l.feature_count).sum(),
        total_requires: libraries.iter().map(|l| l.require_count).sum(),
        total_ensures: libraries.iter().map(|l| l.ensure_count).sum(),
        total_invariants: libraries.iter().map(|l| l.invariant_count).sum(),
        libraries,
        source: SnapshotSource::Sample,
        generated_at: 0,
    }
}

fn library(name: &str, score: u8, counts: [u32; 4], classes: &[(&str, u8, bool)]) -> Library {
    let [features, requires, ensures, invariants] = counts;
    let per_class = features / classes.len().max(1) as u32;

    Library {
        name: name.to_string(),
        path: format!("$SIMPLE/{name}"),
        score,
        feature_count: features,
        require_count: requires,
        ensure_count: ensures,
        invariant_count: invariants,
        classes: classes
            .iter()
            .map(|(class_name, class_score, has_invariant)| Class {
                name: class_name.to_string(),
                path: format!("$SIMPLE/{name}/src/{}.e", class_name.to_lowercase()),
                line: 1,
                score: *class_score,
                feature_count: per_class,
                require_count: requires / classes.len() as u32,
                ensure_count: ensures / classes.len() as u32,
                has_invariant: *has_invariant,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::color::{score_band, ScoreBand};
    use std::collections::HashSet;

    #[test]
    fn sample_is_never_empty() {
        let snapshot = sample_snapshot();
        assert!(snapshot.library_count >= 1);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.source, SnapshotSource::Sample);
    }

    #[test]
    fn sample_covers_every_color_band() {
        let bands: HashSet<ScoreBand> = sample_snapshot()
            .libraries
            .iter()
            .map(|library| score_band(library.score))
            .collect();
        assert_eq!(bands.len(), 6);
    }

    #[test]
    fn sample_is_stable() {
        assert_eq!(sample_snapshot(), sample_snapshot());
    }
}
