use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

pub const STATE_TTL_MINUTES: i64 = 10;
pub const MAX_PENDING_LOGINS: usize = 4096;

/// OAuth `state` values handed out by `/auth/login` and not yet redeemed.
/// Past `capacity` the oldest state is dropped.
pub struct PendingLogins {
    issued: Mutex<HashMap<String, DateTime<Utc>>>,
    capacity: usize,
}

impl Default for PendingLogins {
    fn default() -> Self {
        PendingLogins::with_capacity(MAX_PENDING_LOGINS)
    }
}

impl PendingLogins {
    pub fn with_capacity(capacity: usize) -> Self {
        PendingLogins { issued: Mutex::new(HashMap::new()), capacity: capacity.max(1) }
    }

    pub async fn issue(&self, now: DateTime<Utc>) -> String {
        let state = hex::encode(rand::random::<[u8; 16]>());

        let mut issued = self.issued.lock().await;
        issued.retain(|_, at| !expired(*at, now));
        while issued.len() >= self.capacity {
            let Some(oldest) = issued.iter().min_by_key(|(_, at)| **at).map(|(state, _)| state.clone()) else {
                break;
            };
            issued.remove(&oldest);
            tracing::debug!("Too many pending logins, dropped the oldest state");
        }
        issued.insert(state.clone(), now);

        state
    }

    /// A state is accepted once, within [`STATE_TTL_MINUTES`] of being issued.
    pub async fn consume(&self, state: &str, now: DateTime<Utc>) -> bool {
        match self.issued.lock().await.remove(state) {
            Some(at) => !expired(at, now),
            None => false,
        }
    }
}

fn expired(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - issued_at > Duration::minutes(STATE_TTL_MINUTES)
}
