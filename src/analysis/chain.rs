use crate::analysis::aggregate;
use crate::analysis::provider::MetricsProvider;
use crate::analysis::sample::sample_snapshot;
use crate::analysis::scanner::EnvironmentScanner;
use crate::error::SourceError;
use crate::models::snapshot::Snapshot;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One strategy in the resolution chain.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_resolve(&self) -> Result<Snapshot, SourceError>;
}

pub struct PrimarySource {
    provider: Arc<dyn MetricsProvider>,
}

impl PrimarySource {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl MetricsSource for PrimarySource {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn try_resolve(&self) -> Result<Snapshot, SourceError> {
        let payload = self.provider.query().await?;
        Ok(aggregate::from_primary(payload))
    }
}

pub struct EnvironmentSource {
    scanner: Arc<EnvironmentScanner>,
}

impl EnvironmentSource {
    pub fn new(scanner: Arc<EnvironmentScanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl MetricsSource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn try_resolve(&self) -> Result<Snapshot, SourceError> {
        let scanner = Arc::clone(&self.scanner);
        let scans = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| SourceError::Unavailable(format!("scan task failed: {e}")))?;
        Ok(aggregate::from_scan(&scans))
    }
}

pub struct SampleSource;

#[async_trait]
impl MetricsSource for SampleSource {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn try_resolve(&self) -> Result<Snapshot, SourceError> {
        Ok(sample_snapshot())
    }
}

/// Ordered list of sources; the first non-empty snapshot wins and results
/// are never merged across sources.
pub struct ResolutionChain {
    sources: Vec<Box<dyn MetricsSource>>,
    resolutions: AtomicUsize,
}

impl ResolutionChain {
    pub fn new(sources: Vec<Box<dyn MetricsSource>>) -> Self {
        Self {
            sources,
            resolutions: AtomicUsize::new(0),
        }
    }

    /// Primary source (when configured), then environment scan, then sample data.
    pub fn standard(
        provider: Option<Arc<dyn MetricsProvider>>,
        scanner: Arc<EnvironmentScanner>,
    ) -> Self {
        let mut sources: Vec<Box<dyn MetricsSource>> = Vec::new();
        if let Some(provider) = provider {
            sources.push(Box::new(PrimarySource::new(provider)));
        }
        sources.push(Box::new(EnvironmentSource::new(scanner)));
        sources.push(Box::new(SampleSource));
        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// How many times [`resolve`](Self::resolve) has run.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    pub async fn resolve(&self) -> Snapshot {
        self.resolutions.fetch_add(1, Ordering::SeqCst);

        for source in &self.sources {
            match source.try_resolve().await {
                Ok(snapshot) if !snapshot.is_empty() => {
                    log::info!(
                        "Resolved metrics from {} source: {} libraries, score {}",
                        source.name(),
                        snapshot.library_count,
                        snapshot.score
                    );
                    return snapshot;
                }
                Ok(_) => log::warn!("{} source: {}", source.name(), SourceError::Empty),
                Err(e) => log::warn!("{} source failed: {e}", source.name()),
            }
        }

        log::warn!("All metrics sources failed, using sample dataset");
        sample_snapshot()
    }
}
