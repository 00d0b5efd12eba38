//! Campaign decision engine — picks the banner to show, if any.
//!
//! The decision is recomputed on construction and on every `refresh`, and
//! cleared on `dismiss`. Dismissal state is persisted through
//! [`DismissalSettings`]; the decision itself lives in memory and is
//! published to subscribers synchronously.

use crate::catalog::{CampaignCatalog, CampaignDefinition};
use crate::clock::DateProvider;
use crate::observable::{CurrentValueSubject, SubscriptionId};
use crate::storage::{DismissalSettings, DismissalState};
use std::sync::Arc;
use tracing::{debug, info};

/// The active campaign, or `None` when no banner should be shown.
pub type Decision = Option<CampaignDefinition>;

pub struct CampaignDecisionEngine {
    catalog: CampaignCatalog,
    clock: Arc<dyn DateProvider>,
    settings: DismissalSettings,
    active: CurrentValueSubject<Decision>,
}

impl CampaignDecisionEngine {
    pub fn new(
        catalog: CampaignCatalog,
        clock: Arc<dyn DateProvider>,
        settings: DismissalSettings,
    ) -> Self {
        let engine = Self {
            catalog,
            clock,
            settings,
            active: CurrentValueSubject::new(None),
        };
        engine.refresh(false);
        engine
    }

    /// Recompute the active campaign and publish it.
    ///
    /// A standing dismissal is cleared when `force_reset_dismissal` is set or
    /// when a distinct, reset-flagged campaign has become active. While the
    /// banner stays dismissed the last seen campaign id is left untouched.
    pub fn refresh(&self, force_reset_dismissal: bool) {
        let now = self.clock.now();
        let candidate = self.catalog.active_definition_at(now).cloned();

        if force_reset_dismissal || self.should_reset_dismissal(candidate.as_ref()) {
            info!(
                campaign_id = candidate.as_ref().map(|c| c.id.as_str()),
                forced = force_reset_dismissal,
                "Resetting banner dismissal"
            );
            self.settings.set_has_dismissed_banner(Some(false));
        }

        if self.settings.has_dismissed_banner() == Some(true) {
            debug!(%now, "Banner dismissed, publishing no campaign");
            self.active.send(None);
            return;
        }

        let campaign_id = candidate.as_ref().map(|c| c.id.clone());
        debug!(%now, campaign_id = campaign_id.as_deref(), "Publishing active campaign");
        self.settings.set_last_seen_campaign_id(campaign_id);
        self.active.send(candidate);
    }

    pub fn dismiss(&self) {
        info!(
            campaign_id = self.settings.last_seen_campaign_id().as_deref(),
            "Banner dismissed"
        );
        self.settings.set_has_dismissed_banner(Some(true));
        self.active.send(None);
    }

    /// True only for a new, distinct campaign that opts into overriding a
    /// dismissal recorded against the previously seen campaign.
    pub fn should_reset_dismissal(&self, candidate: Option<&CampaignDefinition>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        let Some(last_seen) = self.settings.last_seen_campaign_id() else {
            return false;
        };
        self.settings.has_dismissed_banner() == Some(true)
            && candidate.resets_previous_dismissal
            && candidate.id != last_seen
    }

    /// Current decision.
    pub fn active_campaign(&self) -> Decision {
        self.active.value()
    }

    /// Receive the current decision now and every later one.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Decision) + Send + Sync + 'static,
    {
        self.active.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.active.unsubscribe(id)
    }

    pub fn dismissal_state(&self) -> DismissalState {
        self.settings.snapshot()
    }

    pub fn catalog(&self) -> &CampaignCatalog {
        &self.catalog
    }
}
