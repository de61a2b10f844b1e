use futures::future::join_all;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::ImageSettings;
use crate::error::{FetchError, ReportError};
use crate::record::CaseRecord;
use crate::schema::SectionSchema;

use super::{discover_image_urls, embed_image, EmbeddedImage, ImageCache, ImageFetcher};

/// An image left out of the report and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a materialization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDiagnostics {
    /// Distinct URLs referenced by the record.
    pub referenced: usize,
    /// URLs served from a pre-populated cache.
    pub reused: usize,
    /// URLs fetched and embedded during this pass.
    pub embedded: usize,
    pub failures: Vec<ImageFailure>,
}

/// Resolves the image references of a case record into an [`ImageCache`].
pub struct ImageMaterializer<'a, F: ImageFetcher + ?Sized> {
    fetcher: &'a F,
    settings: &'a ImageSettings,
}

impl<'a, F: ImageFetcher + ?Sized> ImageMaterializer<'a, F> {
    pub fn new(fetcher: &'a F, settings: &'a ImageSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetches every URL referenced by `record` that `cache` does not hold yet.
    ///
    /// All fetches run concurrently. A failing URL is logged, recorded in the
    /// diagnostics and gets no cache entry; only cancellation aborts the pass.
    pub async fn materialize(
        &self,
        record: &CaseRecord,
        schema: &SectionSchema,
        cache: &mut ImageCache,
        cancel: &CancellationToken,
    ) -> Result<ImageDiagnostics, ReportError> {
        if cancel.is_cancelled() {
            return Err(ReportError::Cancelled);
        }

        let urls = discover_image_urls(record, schema);
        let mut diagnostics = ImageDiagnostics {
            referenced: urls.len(),
            ..ImageDiagnostics::default()
        };

        let pending: Vec<String> = urls.into_iter().filter(|url| !cache.contains(url)).collect();
        diagnostics.reused = diagnostics.referenced - pending.len();
        if pending.is_empty() {
            debug!("No images to fetch ({} reused)", diagnostics.reused);
            return Ok(diagnostics);
        }

        info!("Fetching {} image(s)", pending.len());
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReportError::Cancelled),
            results = join_all(pending.iter().map(|url| self.resolve(url))) => results,
        };

        for (url, result) in pending.into_iter().zip(results) {
            match result {
                Ok(image) => {
                    cache.insert(url, image);
                    diagnostics.embedded += 1;
                }
                Err(err) => {
                    warn!("Omitting image {url}: {err}");
                    diagnostics.failures.push(ImageFailure {
                        url,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(diagnostics)
    }

    async fn resolve(&self, url: &str) -> Result<EmbeddedImage, FetchError> {
        let timeout = self.settings.fetch_timeout();
        let bytes = tokio::time::timeout(timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| FetchError::Timeout(timeout.as_secs()))??;
        embed_image(&bytes, self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    use serde_json::json;

    use crate::schema::ReportKind;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_fn(width, height, |x, _| Rgb([x as u8, 90, 160]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[derive(Default)]
    struct FakeFetcher {
        calls: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
        hang_on: Option<&'static str>,
    }

    impl FakeFetcher {
        fn calls_for(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().unwrap().entry(url.to_owned()).or_default() += 1;
            if self.hang_on == Some(url) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if url.contains("broken") {
                return Err(FetchError::Status(404));
            }
            Ok(png(1200, 600))
        }
    }

    fn record_with_shared_photo() -> CaseRecord {
        CaseRecord::from_value(json!({
            "insuredDetails": { "driverPhoto": "https://cdn.example/driver.jpg" },
            "photos": {
                "documentImages": [
                    "https://cdn.example/driver.jpg",
                    "https://cdn.example/broken.jpg"
                ]
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_each_url_once_and_skips_failures() {
        let fetcher = FakeFetcher::default();
        let settings = ImageSettings::default();
        let mut cache = ImageCache::new();

        let diagnostics = ImageMaterializer::new(&fetcher, &settings)
            .materialize(
                &record_with_shared_photo(),
                ReportKind::OdCase.schema(),
                &mut cache,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(fetcher.calls_for("https://cdn.example/driver.jpg"), 1);
        assert_eq!(diagnostics.referenced, 2);
        assert_eq!(diagnostics.embedded, 1);
        assert_eq!(diagnostics.failures.len(), 1);
        assert_eq!(diagnostics.failures[0].url, "https://cdn.example/broken.jpg");

        let driver = cache.get("https://cdn.example/driver.jpg").unwrap();
        assert_eq!((driver.width(), driver.height()), (800, 400));
        assert!(!cache.contains("https://cdn.example/broken.jpg"));
    }

    #[tokio::test]
    async fn text_only_record_makes_no_calls() {
        let fetcher = FakeFetcher::default();
        let settings = ImageSettings::default();
        let record = CaseRecord::from_value(json!({
            "claimSummary": { "claimNo": "CLM-7" }
        }))
        .unwrap();

        let diagnostics = ImageMaterializer::new(&fetcher, &settings)
            .materialize(
                &record,
                ReportKind::OdCase.schema(),
                &mut ImageCache::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(fetcher.total.load(Ordering::SeqCst), 0);
        assert_eq!(diagnostics, ImageDiagnostics::default());
    }

    #[tokio::test]
    async fn cached_urls_are_not_fetched_again() {
        let fetcher = FakeFetcher::default();
        let settings = ImageSettings::default();
        let mut cache = ImageCache::new();
        cache.insert(
            "https://cdn.example/driver.jpg",
            EmbeddedImage::new(1, 1, vec![0xff, 0xd8]),
        );

        let diagnostics = ImageMaterializer::new(&fetcher, &settings)
            .materialize(
                &record_with_shared_photo(),
                ReportKind::OdCase.schema(),
                &mut cache,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(fetcher.calls_for("https://cdn.example/driver.jpg"), 0);
        assert_eq!(diagnostics.reused, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_times_out_without_failing_the_run() {
        let fetcher = FakeFetcher {
            hang_on: Some("https://cdn.example/driver.jpg"),
            ..FakeFetcher::default()
        };
        let settings = ImageSettings::default();
        let mut cache = ImageCache::new();

        let diagnostics = ImageMaterializer::new(&fetcher, &settings)
            .materialize(
                &record_with_shared_photo(),
                ReportKind::OdCase.schema(),
                &mut cache,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(cache.is_empty());
        assert!(diagnostics
            .failures
            .iter()
            .any(|failure| failure.reason.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_abandons_the_batch() {
        let fetcher = FakeFetcher {
            hang_on: Some("https://cdn.example/driver.jpg"),
            ..FakeFetcher::default()
        };
        let settings = ImageSettings::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = ImageMaterializer::new(&fetcher, &settings)
            .materialize(
                &record_with_shared_photo(),
                ReportKind::OdCase.schema(),
                &mut ImageCache::new(),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(ReportError::Cancelled)));
    }
}
