//! Promotional banner selection — a compiled-in campaign schedule, persisted
//! dismissal state, and an engine that publishes the campaign to show.

pub mod catalog;
pub mod clock;
pub mod engine;
pub mod observable;
pub mod storage;

pub use catalog::{ActivationRule, BannerDisplay, BannerIcon, CampaignCatalog, CampaignDefinition};
pub use clock::{DateProvider, FixedClock, SystemClock};
pub use engine::{CampaignDecisionEngine, Decision};
pub use observable::{CurrentValueSubject, SubscriptionId};
pub use storage::{DismissalSettings, DismissalState, JsonFileStore, KeyValueStore, MemoryStore};
