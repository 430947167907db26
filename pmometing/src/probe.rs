//! Song duration probing
//!
//! Reading a song's duration needs a playback element that loads the file and
//! eventually signals "metadata ready" or "error". Nothing guarantees that
//! either signal ever fires, so every probe goes through [`probe_duration`],
//! which bounds it with a deadline and a cancellation token.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A playback element able to report the duration of a song file
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Resolves once the element has loaded the metadata of `url`
    async fn duration(&self, url: &str) -> Result<Duration>;
}

/// Runs `probe` on `url`, giving up after `timeout` or on cancellation
///
/// A probe that never signals yields [`Error::ProbeTimeout`]; a cancelled one
/// yields [`Error::Cancelled`]. In both cases the probe future is dropped.
pub async fn probe_duration(
    probe: &dyn DurationProbe,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Duration> {
    tokio::select! {
        result = probe.duration(url) => {
            debug!(url, ?result, "Duration probe finished");
            result
        }
        _ = tokio::time::sleep(timeout) => {
            warn!(url, ?timeout, "Duration probe never signalled");
            Err(Error::ProbeTimeout(timeout))
        }
        _ = cancel.cancelled() => Err(Error::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Duration);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn duration(&self, _url: &str) -> Result<Duration> {
            Ok(self.0)
        }
    }

    struct SilentProbe;

    #[async_trait]
    impl DurationProbe for SilentProbe {
        async fn duration(&self, _url: &str) -> Result<Duration> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_probe_resolves() {
        let probe = FixedProbe(Duration::from_secs(215));
        let duration = probe_duration(
            &probe,
            "https://example.com/a.mp3",
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(duration, Duration::from_secs(215));
    }

    #[tokio::test]
    async fn test_silent_probe_times_out() {
        let result = probe_duration(
            &SilentProbe,
            "https://example.com/a.mp3",
            Duration::from_millis(50),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(Error::ProbeTimeout(_))));
    }

    #[tokio::test]
    async fn test_cancelled_probe() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = probe_duration(
            &SilentProbe,
            "https://example.com/a.mp3",
            Duration::from_secs(60),
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
