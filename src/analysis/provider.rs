use crate::error::SourceError;
use crate::models::payload::ProviderPayload;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;

/// Primary source of contract metrics.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn query(&self) -> Result<ProviderPayload, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Runs an external metrics command and parses the JSON it prints on stdout.
#[derive(Debug, Clone)]
pub struct CommandMetricsProvider {
    settings: ProviderSettings,
}

impl CommandMetricsProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl MetricsProvider for CommandMetricsProvider {
    async fn query(&self) -> Result<ProviderPayload, SourceError> {
        let program = &self.settings.command;
        let mut command = tokio::process::Command::new(program);
        command
            .args(&self.settings.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.settings.timeout, command.output()).await {
            Err(_) => {
                return Err(SourceError::Timeout(
                    self.settings.timeout.as_millis() as u64,
                ))
            }
            Ok(Err(e)) => {
                return Err(SourceError::Unavailable(format!(
                    "failed to run {program}: {e}"
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Unavailable(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_payload(&output.stdout)
    }
}

/// Decode a provider payload, mapping an explicit `"available": false` to
/// [`SourceError::Unavailable`].
pub fn parse_payload(raw: &[u8]) -> Result<ProviderPayload, SourceError> {
    let payload: ProviderPayload =
        serde_json::from_slice(raw).map_err(|e| SourceError::Malformed(e.to_string()))?;

    if !payload.available {
        return Err(SourceError::Unavailable(
            "provider reported metrics unavailable".to_string(),
        ));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_non_json_and_unavailable() {
        assert!(matches!(
            parse_payload(b"Eiffel LSP starting..."),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(
            parse_payload(br#"{ "available": false, "overall_score": 0, "libraries": [] }"#),
            Err(SourceError::Unavailable(_))
        ));
    }

    #[test]
    fn parse_accepts_valid_payload() {
        let payload =
            parse_payload(br#"{ "overall_score": 42, "libraries": [ { "name": "a", "score": 1 } ] }"#)
                .unwrap();
        assert_eq!(payload.libraries.len(), 1);
    }

    #[cfg(unix)]
    fn shell(script: &str, timeout_ms: u64) -> CommandMetricsProvider {
        CommandMetricsProvider::new(ProviderSettings {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_provider_reads_stdout() {
        let provider = shell(
            r#"echo '{"overall_score": 77, "libraries": [{"name": "simple_json", "score": 77}]}'"#,
            5_000,
        );
        let payload = provider.query().await.unwrap();
        assert_eq!(payload.overall_score, 77.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_provider_reports_failures() {
        assert!(matches!(
            shell("exit 3", 5_000).query().await,
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            shell("sleep 5", 100).query().await,
            Err(SourceError::Timeout(100))
        ));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let provider = CommandMetricsProvider::new(ProviderSettings {
            command: "contractlens-no-such-metrics-binary".to_string(),
            args: Vec::new(),
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(
            provider.query().await,
            Err(SourceError::Unavailable(_))
        ));
    }
}
