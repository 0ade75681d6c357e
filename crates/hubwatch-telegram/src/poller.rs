//! Periodic polling of watched accounts for new default-branch commits.
//!
//! Each tick walks the subscriptions in registry order and, for every
//! repository of the watched account, compares the default-branch head with
//! the stored cursor. Failures are isolated: an unreachable channel, a
//! failing account or a failing repository is logged and skipped, and the
//! tick moves on to the next item.

use std::sync::Arc;
use std::time::Duration;

use hubwatch_core::{CodeHost, GitHubError};
use hubwatch_models::{CommitNotification, Repository, Subscription};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::notifications::{ChannelSink, ChannelTarget};
use crate::state::{CursorDecision, WatchState};

/// Counters describing one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Subscriptions examined.
    pub subscriptions: usize,
    /// Subscriptions skipped because the channel could not be resolved.
    pub unreachable_channels: usize,
    /// Accounts whose repository listing failed.
    pub failed_accounts: usize,
    /// Repositories whose head was read successfully.
    pub repositories: usize,
    /// Repositories whose head could not be read.
    pub failed_repositories: usize,
    /// Cursors created on first observation.
    pub seeded: usize,
    /// Notifications delivered.
    pub notified: usize,
    /// Notifications that failed to deliver.
    pub failed_deliveries: usize,
}

/// Recurring task that detects new commits and dispatches notifications.
pub struct UpdatePoller {
    state: Arc<WatchState>,
    host: Arc<dyn CodeHost>,
    sink: Arc<dyn ChannelSink>,
    interval: Duration,
}

impl UpdatePoller {
    pub fn new(
        state: Arc<WatchState>,
        host: Arc<dyn CodeHost>,
        sink: Arc<dyn ChannelSink>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            host,
            sink,
            interval,
        }
    }

    /// Run the poll loop on a background task.
    ///
    /// Aborting the returned handle stops polling.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Tick forever. The first tick runs immediately.
    pub async fn run(&self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Update poller started");

        loop {
            ticker.tick().await;
            let report = self.tick().await;
            if report.subscriptions > 0 {
                debug!(?report, "Poll tick complete");
            }
        }
    }

    /// Run a single poll over every subscription.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let subscriptions = self.state.list_all().await;
        if subscriptions.is_empty() {
            return report;
        }

        for subscription in subscriptions {
            report.subscriptions += 1;
            self.poll_subscription(&subscription, &mut report).await;
        }

        report
    }

    async fn poll_subscription(&self, subscription: &Subscription, report: &mut TickReport) {
        let target = match self.sink.resolve(subscription.channel_id).await {
            Ok(target) => target,
            Err(e) => {
                warn!(channel_id = %subscription.channel_id, error = %e, "Skipping unreachable channel");
                report.unreachable_channels += 1;
                return;
            }
        };

        let repos = match self
            .host
            .list_repositories(&subscription.watched_account)
            .await
        {
            Ok(repos) => repos,
            Err(e) => {
                warn!(
                    account = %subscription.watched_account,
                    channel_id = %subscription.channel_id,
                    error = %e,
                    "Failed to list repositories"
                );
                report.failed_accounts += 1;
                return;
            }
        };

        for repo in &repos {
            if let Err(e) = self.poll_repository(&target, repo, report).await {
                warn!(repo = %repo.full_name, error = %e, "Failed to check repository");
                report.failed_repositories += 1;
            }
        }
    }

    async fn poll_repository(
        &self,
        target: &ChannelTarget,
        repo: &Repository,
        report: &mut TickReport,
    ) -> Result<(), GitHubError> {
        debug!(repo = %repo.full_name, branch = %repo.default_branch, "Checking for changes");

        let head = self.host.head_commit(repo).await?;
        report.repositories += 1;

        let decision = self.state.check_head(&repo.full_name, &head.sha).await;
        match &decision {
            CursorDecision::Seed => {
                debug!(repo = %repo.full_name, sha = %head.sha, "Seeding cursor");
                report.seeded += 1;
            }
            CursorDecision::Changed { previous } => {
                info!(repo = %repo.full_name, from = %previous, to = %head.sha, "New commit detected");
                let notification = CommitNotification::new(&repo.full_name, &head);
                match self.sink.deliver(target, &notification).await {
                    Ok(()) => report.notified += 1,
                    Err(e) => {
                        warn!(
                            channel_id = %target.id,
                            repo = %repo.full_name,
                            error = %e,
                            "Failed to deliver notification"
                        );
                        report.failed_deliveries += 1;
                    }
                }
            }
            CursorDecision::Unchanged => {}
        }

        if decision.advances_cursor() {
            self.state.record_head(&repo.full_name, &head.sha).await;
        }
        Ok(())
    }
}
