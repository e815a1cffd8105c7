//! Premium promotion, demotion and the expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::policy::premium::{self, PremiumDuration};
use crate::domain::repositories::UserRepository;
use crate::domain::user::PremiumState;
use crate::domain::{DomainError, DomainResult};

/// Outcome of one sweep run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Users found with a lapsed expiry.
    pub examined: usize,
    /// Users actually demoted; the rest were re-promoted in the meantime.
    pub cleared: usize,
}

pub struct PremiumService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl PremiumService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Grants premium for `days` starting now, replacing any current grant.
    pub async fn promote(&self, admin_id: Uuid, user_id: Uuid, days: i64) -> DomainResult<PremiumState> {
        let duration = PremiumDuration::try_from(days)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;

        let state = premium::promote(duration, admin_id, self.clock.now());
        self.users.set_premium(user.id, &state).await?;

        info!(
            user_id = %user_id,
            admin_id = %admin_id,
            days,
            expires_at = ?state.expires_at,
            "User promoted to premium"
        );
        Ok(state)
    }

    pub async fn demote(&self, admin_id: Uuid, user_id: Uuid) -> DomainResult<()> {
        self.users.set_premium(user_id, &premium::demote()).await?;
        info!(user_id = %user_id, admin_id = %admin_id, "User demoted from premium");
        Ok(())
    }

    /// Clears every grant whose expiry is strictly in the past.
    ///
    /// Each clear is keyed on the expiry that was read, so a promotion that
    /// lands between the read and the write survives. Running the sweep
    /// twice in a row changes nothing the second time.
    pub async fn sweep_expired(&self) -> DomainResult<SweepReport> {
        let now = self.clock.now();
        let lapsed = self.users.list_lapsed_premium(now).await?;

        let mut report = SweepReport {
            examined: lapsed.len(),
            cleared: 0,
        };
        for (user_id, expires_at) in lapsed {
            if self.users.clear_premium_if_expiry(user_id, expires_at).await? {
                report.cleared += 1;
                info!(user_id = %user_id, expired_at = %expires_at, "Premium expired");
            } else {
                debug!(user_id = %user_id, "Premium changed since read, left untouched");
            }
        }

        if report.examined > 0 {
            info!(examined = report.examined, cleared = report.cleared, "Premium sweep finished");
        }
        Ok(report)
    }

    /// Runs [`PremiumService::sweep_expired`] every `interval` until the
    /// runtime shuts down. The first run happens immediately.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_expired().await {
                    error!(error = %e, "Premium sweep failed");
                }
            }
        })
    }
}
