use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::transport::{EventSender, SessionEvent};

/// Single pending idle-disconnect deadline.
///
/// `refresh` cancels the pending deadline before scheduling a new one, so
/// at most one [`SessionEvent::IdleTimeout`] can ever be live. Each
/// schedule gets a new generation; a timeout whose generation no longer
/// matches was superseded and must be ignored.
#[derive(Debug)]
pub struct DisconnectTimer {
    threshold: Duration,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl DisconnectTimer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            generation: 0,
            pending: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancels any pending deadline and schedules a new one `threshold`
    /// from now.
    pub fn refresh(&mut self, events: &EventSender) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let events = events.clone();
        let deadline = tokio::time::sleep(self.threshold);

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = deadline => {
                    let _ = events.send(SessionEvent::IdleTimeout(generation));
                }
            }
        });

        debug!(
            "⏲️ Desconexión por inactividad programada en {}",
            humantime::format_duration(self.threshold)
        );
        self.pending = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
            debug!("⏲️ Desconexión por inactividad cancelada");
        }
    }

    /// Consumes a timeout. Returns `true` only for the live generation.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for DisconnectTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::{advance, Instant};

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_threshold() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = DisconnectTimer::new(Duration::from_secs(60));
        let start = Instant::now();

        timer.refresh(&tx);
        let event = rx.recv().await;

        assert_eq!(event, Some(SessionEvent::IdleTimeout(1)));
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(timer.fire(1));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_reschedules_instead_of_stacking() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = DisconnectTimer::new(Duration::from_secs(60));
        let start = Instant::now();

        timer.refresh(&tx);
        advance(Duration::from_secs(30)).await;
        timer.refresh(&tx);
        advance(Duration::from_secs(45)).await;
        timer.refresh(&tx);

        let event = rx.recv().await;
        let elapsed = start.elapsed();

        assert_eq!(event, Some(SessionEvent::IdleTimeout(3)));
        assert!(elapsed >= Duration::from_secs(135));
        assert!(elapsed < Duration::from_secs(136));

        // Nothing else is scheduled behind it.
        advance(Duration::from_secs(600)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = DisconnectTimer::new(Duration::from_secs(5));

        timer.refresh(&tx);
        timer.cancel();
        advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert!(!timer.is_pending());
    }

    #[test]
    fn stale_generation_is_rejected() {
        let mut timer = DisconnectTimer::new(Duration::from_secs(5));
        assert!(!timer.fire(0));
        assert!(!timer.fire(7));
    }
}
