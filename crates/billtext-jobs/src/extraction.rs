//! Converter lookup by strategy.
//!
//! The extractor decides an attachment's [`ExtractionStrategy`] from its
//! extension; this registry holds the one adapter that handles each strategy.
//! A strategy with no adapter is a row-scoped extraction failure, so under
//! the skip policy a missing converter costs one row, not the run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use billtext_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use crate::adapters::{
    OfficeConvertAdapter, PdfTextAdapter, SpreadsheetAdapter, TextNativeAdapter,
    WordLegacyAdapter,
};

#[derive(Default)]
pub struct ExtractionRegistry {
    adapters: HashMap<ExtractionStrategy, Arc<dyn ExtractionAdapter>>,
}

impl ExtractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in converter. External commands are killed after `timeout`.
    pub fn with_defaults(timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfTextAdapter::new(timeout)));
        registry.register(Arc::new(WordLegacyAdapter::new(timeout)));
        registry.register(Arc::new(OfficeConvertAdapter::new(timeout)));
        registry.register(Arc::new(SpreadsheetAdapter));
        registry.register(Arc::new(TextNativeAdapter));
        registry
    }

    /// Install `adapter` for its strategy; a later registration wins.
    pub fn register(&mut self, adapter: Arc<dyn ExtractionAdapter>) {
        self.adapters.insert(adapter.strategy(), adapter);
    }

    /// Convert the scratch file at `path`.
    pub async fn extract(
        &self,
        strategy: ExtractionStrategy,
        path: &Path,
    ) -> Result<ExtractionResult> {
        match self.adapters.get(&strategy) {
            Some(adapter) => adapter.extract(path).await,
            None => Err(Error::Extraction(format!(
                "no converter installed for {} attachments",
                strategy
            ))),
        }
    }

    /// Whether each registered converter is usable on this host.
    ///
    /// A health check that errors counts as unavailable.
    pub async fn health_check_all(&self) -> HashMap<ExtractionStrategy, bool> {
        let mut results = HashMap::with_capacity(self.adapters.len());
        for (strategy, adapter) in &self.adapters {
            let healthy = adapter.health_check().await.unwrap_or(false);
            results.insert(*strategy, healthy);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Converter that returns a fixed text and reports a fixed health state.
    struct CannedConverter {
        text: &'static str,
        installed: bool,
    }

    #[async_trait]
    impl ExtractionAdapter for CannedConverter {
        fn strategy(&self) -> ExtractionStrategy {
            ExtractionStrategy::PdfText
        }

        async fn extract(&self, _path: &Path) -> Result<ExtractionResult> {
            Ok(ExtractionResult {
                content: self.text.as_bytes().to_vec(),
                metadata: json!({}),
            })
        }

        async fn health_check(&self) -> Result<bool> {
            if self.installed {
                Ok(true)
            } else {
                Err(Error::Extraction("pdftotext: command not found".to_string()))
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_defaults_cover_every_strategy() {
        let registry = ExtractionRegistry::with_defaults(Duration::from_secs(5));
        for strategy in [
            ExtractionStrategy::PdfText,
            ExtractionStrategy::WordLegacy,
            ExtractionStrategy::OfficeConvert,
            ExtractionStrategy::Spreadsheet,
            ExtractionStrategy::TextNative,
        ] {
            assert!(registry.adapters.contains_key(&strategy), "no converter for {}", strategy);
        }
    }

    #[tokio::test]
    async fn test_missing_converter_is_row_scoped() {
        let err = ExtractionRegistry::new()
            .extract(ExtractionStrategy::WordLegacy, Path::new("attachment.doc"))
            .await
            .unwrap_err();
        assert!(err.is_row_scoped());
        assert!(err.to_string().contains("word_legacy"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_later_registration_replaces_earlier() {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(CannedConverter {
            text: "first draft",
            installed: true,
        }));
        registry.register(Arc::new(CannedConverter {
            text: "as amended",
            installed: true,
        }));

        let result = registry
            .extract(ExtractionStrategy::PdfText, Path::new("attachment.pdf"))
            .await
            .unwrap();
        assert_eq!(result.content, b"as amended");
        assert_eq!(registry.health_check_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_erroring_health_check_reads_as_unavailable() {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(CannedConverter {
            text: "",
            installed: false,
        }));
        registry.register(Arc::new(TextNativeAdapter));

        let results = registry.health_check_all().await;
        assert!(!results[&ExtractionStrategy::PdfText]);
        assert!(results[&ExtractionStrategy::TextNative]);
    }
}
