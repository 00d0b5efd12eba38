//! Campaign catalog — the compiled-in schedule of promotional banners.
//!
//! Entries are evaluated in declaration order and the first one whose
//! activation rule holds wins, so at most one campaign is active at a time.

use campaign_core::{CampaignError, CampaignResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Time window in which a campaign is eligible. Intervals are half-open:
/// `start` is inclusive, `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ActivationRule {
    LimitedTime {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    IndefiniteAfter {
        start: DateTime<Utc>,
    },
    Always,
}

impl ActivationRule {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            ActivationRule::LimitedTime { start, end } => *start <= now && now < *end,
            ActivationRule::IndefiniteAfter { start } => *start <= now,
            ActivationRule::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerIcon {
    Gift,
    PriceTag,
    Sparkles,
}

/// Display attributes handed to the UI layer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerDisplay {
    pub background_color: String,
    pub foreground_color: String,
    pub icon: BannerIcon,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDefinition {
    pub id: String,
    pub activation: ActivationRule,
    /// When set, this campaign becoming active clears a standing dismissal
    /// that was recorded against a different campaign.
    pub resets_previous_dismissal: bool,
    pub display: BannerDisplay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignCatalog {
    definitions: Vec<CampaignDefinition>,
}

impl CampaignCatalog {
    pub fn new(definitions: Vec<CampaignDefinition>) -> Self {
        Self { definitions }
    }

    /// The schedule shipped with the app.
    pub fn builtin() -> Self {
        Self::new(vec![
            CampaignDefinition {
                id: "holiday-sale-2026".to_string(),
                activation: ActivationRule::LimitedTime {
                    start: from_unix(HOLIDAY_SALE_START),
                    end: from_unix(HOLIDAY_SALE_END),
                },
                resets_previous_dismissal: true,
                display: BannerDisplay {
                    background_color: "#B3261E".to_string(),
                    foreground_color: "#FFFFFF".to_string(),
                    icon: BannerIcon::Gift,
                    text: "Holiday sale: 50% off the yearly plan".to_string(),
                },
            },
            CampaignDefinition {
                id: "price-drop-2026".to_string(),
                activation: ActivationRule::IndefiniteAfter {
                    start: from_unix(PRICE_DROP_START),
                },
                resets_previous_dismissal: true,
                display: BannerDisplay {
                    background_color: "#0B57D0".to_string(),
                    foreground_color: "#FFFFFF".to_string(),
                    icon: BannerIcon::PriceTag,
                    text: "New lower price for the yearly plan".to_string(),
                },
            },
            CampaignDefinition {
                id: "welcome".to_string(),
                activation: ActivationRule::Always,
                resets_previous_dismissal: false,
                display: BannerDisplay {
                    background_color: "#E8F0FE".to_string(),
                    foreground_color: "#1F1F1F".to_string(),
                    icon: BannerIcon::Sparkles,
                    text: "Upgrade to unlock every feature".to_string(),
                },
            },
        ])
    }

    /// First definition, in declaration order, whose rule holds at `now`.
    pub fn active_definition_at(&self, now: DateTime<Utc>) -> Option<&CampaignDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.activation.is_active_at(now))
    }

    pub fn definitions(&self) -> &[CampaignDefinition] {
        &self.definitions
    }

    /// Check the construction-time contract: non-empty unique ids and
    /// non-empty limited-time windows.
    pub fn validate(&self) -> CampaignResult<()> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if definition.id.is_empty() {
                return Err(CampaignError::Catalog("campaign id must not be empty".into()));
            }
            if !seen.insert(definition.id.as_str()) {
                return Err(CampaignError::Catalog(format!(
                    "duplicate campaign id: {}",
                    definition.id
                )));
            }
            if let ActivationRule::LimitedTime { start, end } = &definition.activation {
                if start >= end {
                    return Err(CampaignError::Catalog(format!(
                        "campaign {} ends before it starts",
                        definition.id
                    )));
                }
            }
        }
        Ok(())
    }
}

// 2026-11-27T00:00:00Z .. 2026-12-02T00:00:00Z
const HOLIDAY_SALE_START: i64 = 1_795_737_600;
const HOLIDAY_SALE_END: i64 = 1_796_169_600;
// 2026-06-01T00:00:00Z
const PRICE_DROP_START: i64 = 1_780_272_000;

fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(secs * 1_000_000_000)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn definition(id: &str, activation: ActivationRule) -> CampaignDefinition {
        CampaignDefinition {
            id: id.to_string(),
            activation,
            resets_previous_dismissal: false,
            display: BannerDisplay {
                background_color: "#000000".to_string(),
                foreground_color: "#FFFFFF".to_string(),
                icon: BannerIcon::Gift,
                text: id.to_string(),
            },
        }
    }

    #[test]
    fn test_limited_time_is_half_open() {
        let start = utc(2026, 3, 1);
        let end = utc(2026, 4, 1);
        let rule = ActivationRule::LimitedTime { start, end };

        assert!(!rule.is_active_at(start - Duration::seconds(1)));
        assert!(rule.is_active_at(start));
        assert!(rule.is_active_at(end - Duration::seconds(1)));
        assert!(!rule.is_active_at(end));
    }

    #[test]
    fn test_indefinite_after_and_always() {
        let start = utc(2026, 6, 1);
        let rule = ActivationRule::IndefiniteAfter { start };
        assert!(!rule.is_active_at(start - Duration::milliseconds(1)));
        assert!(rule.is_active_at(start));
        assert!(rule.is_active_at(utc(2100, 1, 1)));

        assert!(ActivationRule::Always.is_active_at(utc(1970, 1, 2)));
    }

    #[test]
    fn test_first_match_wins() {
        let catalog = CampaignCatalog::new(vec![
            definition(
                "first",
                ActivationRule::LimitedTime {
                    start: utc(2026, 1, 1),
                    end: utc(2026, 2, 1),
                },
            ),
            definition("second", ActivationRule::Always),
        ]);

        let inside = catalog.active_definition_at(utc(2026, 1, 15)).unwrap();
        assert_eq!(inside.id, "first");
        let outside = catalog.active_definition_at(utc(2026, 2, 1)).unwrap();
        assert_eq!(outside.id, "second");
    }

    #[test]
    fn test_no_match_returns_none() {
        let catalog = CampaignCatalog::new(vec![definition(
            "later",
            ActivationRule::IndefiniteAfter {
                start: utc(2027, 1, 1),
            },
        )]);
        assert!(catalog.active_definition_at(utc(2026, 1, 1)).is_none());
        assert!(CampaignCatalog::default()
            .active_definition_at(utc(2026, 1, 1))
            .is_none());
    }

    #[test]
    fn test_builtin_schedule() {
        let catalog = CampaignCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.definitions().len(), 3);
        assert_eq!(from_unix(HOLIDAY_SALE_START), utc(2026, 11, 27));
        assert_eq!(from_unix(HOLIDAY_SALE_END), utc(2026, 12, 2));
        assert_eq!(from_unix(PRICE_DROP_START), utc(2026, 6, 1));

        let at = |y, m, d| catalog.active_definition_at(utc(y, m, d)).unwrap().id.clone();
        assert_eq!(at(2026, 1, 1), "welcome");
        assert_eq!(at(2026, 6, 1), "price-drop-2026");
        assert_eq!(at(2026, 11, 27), "holiday-sale-2026");
        assert_eq!(at(2026, 12, 2), "price-drop-2026");
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let duplicate = CampaignCatalog::new(vec![
            definition("a", ActivationRule::Always),
            definition("a", ActivationRule::Always),
        ]);
        assert!(matches!(duplicate.validate(), Err(CampaignError::Catalog(_))));

        let inverted = CampaignCatalog::new(vec![definition(
            "inverted",
            ActivationRule::LimitedTime {
                start: utc(2026, 2, 1),
                end: utc(2026, 2, 1),
            },
        )]);
        assert!(inverted.validate().is_err());

        let unnamed = CampaignCatalog::new(vec![definition("", ActivationRule::Always)]);
        assert!(unnamed.validate().is_err());
    }
}
