//! Session keepalive
//!
//! The node drops idle telnet sessions, so a single NUL byte is written
//! on a fixed period for as long as the session lives.

use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const KEEPALIVE_BYTE: &[u8] = &[0];

/// Write a keepalive byte every `period` until cancelled or a write fails.
pub async fn run_keepalive<W>(mut writer: W, period: Duration, cancel: CancellationToken)
where
    W: AsyncWrite + Unpin,
{
    if period.is_zero() {
        tracing::warn!("Keepalive period is zero, keepalive disabled");
        cancel.cancelled().await;
        return;
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let result = async {
                    writer.write_all(KEEPALIVE_BYTE).await?;
                    writer.flush().await
                }
                .await;

                if let Err(e) = result {
                    tracing::warn!(error = %e, "Keepalive failed");
                    return;
                }
                tracing::trace!("Keepalive sent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test(start_paused = true)]
    async fn test_sends_nul_each_period() {
        let (client, mut node) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_keepalive(client, Duration::from_secs(120), cancel.clone()));

        tokio::time::sleep(Duration::from_secs(119)).await;
        let mut buf = [0u8; 8];
        assert!(tokio::time::timeout(Duration::ZERO, node.read(&mut buf)).await.is_err());

        tokio::time::sleep(Duration::from_secs(242)).await;
        let n = node.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0, 0, 0]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_disables_keepalive() {
        let (client, mut node) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_keepalive(client, Duration::ZERO, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(600)).await;
        let mut buf = [0u8; 8];
        assert!(tokio::time::timeout(Duration::ZERO, node.read(&mut buf)).await.is_err());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_peer_gone() {
        let (client, node) = tokio::io::duplex(64);
        drop(node);

        run_keepalive(client, Duration::from_millis(1), CancellationToken::new()).await;
    }
}
