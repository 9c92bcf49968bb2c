use serde::{Deserialize, Serialize};

/// Which resolution strategy produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Primary,
    Environment,
    Sample,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub name: String,
    pub path: String,
    pub line: u32,
    pub score: u8,
    pub feature_count: u32,
    pub require_count: u32,
    pub ensure_count: u32,
    pub has_invariant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    pub path: String,
    pub score: u8,
    pub feature_count: u32,
    pub require_count: u32,
    pub ensure_count: u32,
    pub invariant_count: u32,
    /// Empty until the library is drilled into when the source does not ship classes.
    pub classes: Vec<Class>,
}

/// One complete, immutable result of a metrics fetch.
///
/// Snapshots are shared behind an `Arc` once cached and are never mutated;
/// a new fetch replaces the cached value wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub name: String,
    pub score: u8,
    pub library_count: u32,
    pub class_count: u32,
    pub total_features: u32,
    pub total_requires: u32,
    pub total_ensures: u32,
    pub total_invariants: u32,
    pub libraries: Vec<Library>,
    pub source: SnapshotSource,
    pub generated_at: i64,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.library_count == 0 || self.libraries.is_empty()
    }

    /// Exact name match first, then a case-insensitive match.
    pub fn find_library(&self, name: &str) -> Option<&Library> {
        self.libraries
            .iter()
            .find(|library| library.name == name)
            .or_else(|| {
                self.libraries
                    .iter()
                    .find(|library| library.name.eq_ignore_ascii_case(name))
            })
    }
}

/// Round and clamp a raw score into the 0–100 range.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(name: &str) -> Library {
        Library {
            name: name.to_string(),
            path: format!("/libs/{name}"),
            score: 70,
            feature_count: 10,
            require_count: 4,
            ensure_count: 4,
            invariant_count: 1,
            classes: Vec::new(),
        }
    }

    fn snapshot(libraries: Vec<Library>) -> Snapshot {
        Snapshot {
            name: "workspace".to_string(),
            score: 70,
            library_count: libraries.len() as u32,
            class_count: 0,
            total_features: 0,
            total_requires: 0,
            total_ensures: 0,
            total_invariants: 0,
            libraries,
            source: SnapshotSource::Primary,
            generated_at: 0,
        }
    }

    #[test]
    fn finds_library_exactly_then_case_insensitively() {
        let snap = snapshot(vec![library("simple_json"), library("Simple_Http")]);

        assert_eq!(snap.find_library("simple_json").unwrap().name, "simple_json");
        assert_eq!(snap.find_library("SIMPLE_JSON").unwrap().name, "simple_json");
        assert_eq!(snap.find_library("simple_http").unwrap().name, "Simple_Http");
        assert!(snap.find_library("simple_xml").is_none());
    }

    #[test]
    fn empty_snapshot_has_no_libraries() {
        assert!(snapshot(Vec::new()).is_empty());
        assert!(!snapshot(vec![library("a")]).is_empty());
    }

    #[test]
    fn clamps_scores_into_percentage_range() {
        assert_eq!(clamp_score(-4.0), 0);
        assert_eq!(clamp_score(41.6), 42);
        assert_eq!(clamp_score(250.0), 100);
        assert_eq!(clamp_score(f64::NAN), 0);
    }
}
