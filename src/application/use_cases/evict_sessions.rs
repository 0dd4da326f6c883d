use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::application::ConversationStore;

pub struct EvictIdleSessionsUseCase {
    store: Arc<dyn ConversationStore>,
    max_idle: Duration,
}

impl EvictIdleSessionsUseCase {
    pub fn new(store: Arc<dyn ConversationStore>, max_idle: Duration) -> Self {
        Self { store, max_idle }
    }

    pub async fn execute(&self) -> usize {
        let evicted = self.store.evict_idle(self.max_idle).await;
        if evicted > 0 {
            info!(
                "Evicted {} idle session(s), {} remaining",
                evicted,
                self.store.session_count().await
            );
        } else {
            debug!("No idle sessions to evict");
        }
        evicted
    }

    /// Runs [`Self::execute`] forever, ticking at half the idle limit (at least once a second).
    pub async fn run_periodically(self) {
        let period = (self.max_idle / 2).max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.execute().await;
        }
    }
}
