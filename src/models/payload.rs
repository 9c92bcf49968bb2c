use serde::Deserialize;

/// Hierarchical payload reported by the primary metrics source.
///
/// Counts are unsigned so a negative value fails deserialization and the
/// payload is treated as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPayload {
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub name: Option<String>,
    pub overall_score: f64,
    #[serde(default)]
    pub library_count: Option<u32>,
    #[serde(default)]
    pub class_count: Option<u32>,
    #[serde(default)]
    pub total_features: Option<u32>,
    #[serde(default)]
    pub total_requires: Option<u32>,
    #[serde(default)]
    pub total_ensures: Option<u32>,
    #[serde(default)]
    pub total_invariants: Option<u32>,
    pub libraries: Vec<PayloadLibrary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadLibrary {
    pub name: String,
    #[serde(default)]
    pub path: String,
    pub score: f64,
    #[serde(default)]
    pub features: u32,
    #[serde(default)]
    pub requires: u32,
    #[serde(default)]
    pub ensures: u32,
    #[serde(default)]
    pub invariants: u32,
    #[serde(default)]
    pub classes: Vec<PayloadClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadClass {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_line")]
    pub line: u32,
    pub score: f64,
    #[serde(default)]
    pub features: u32,
    #[serde(default)]
    pub requires: u32,
    #[serde(default)]
    pub ensures: u32,
    #[serde(default)]
    pub has_invariant: bool,
}

fn default_available() -> bool {
    true
}

fn default_line() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_payload_with_defaults() {
        let payload: ProviderPayload = serde_json::from_str(
            r#"{
                "overall_score": 42,
                "libraries": [
                    { "name": "simple_json", "score": 80.5,
                      "classes": [ { "name": "JSON_PARSER", "score": 90 } ] }
                ]
            }"#,
        )
        .unwrap();

        assert!(payload.available);
        assert_eq!(payload.overall_score, 42.0);
        assert!(payload.library_count.is_none());
        assert_eq!(payload.libraries[0].classes[0].line, 1);
        assert!(!payload.libraries[0].classes[0].has_invariant);
    }

    #[test]
    fn rejects_negative_counts() {
        let parsed = serde_json::from_str::<ProviderPayload>(
            r#"{ "overall_score": 10, "libraries": [ { "name": "a", "score": 1, "features": -3 } ] }"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_payload_without_libraries() {
        let parsed = serde_json::from_str::<ProviderPayload>(r#"{ "overall_score": 10 }"#);
        assert!(parsed.is_err());
    }
}
