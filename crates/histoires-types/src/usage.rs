//! Usage counters and tier limits
//!
//! [`UsageLimits`] is the single table of per-tier limits. Every quota
//! decision in the system goes through it.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Tier, TypeError};

/// A metered action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageAction {
    /// Generating a new story
    CreateStory,
    /// Downloading a story
    Download,
    /// Synthesizing narration audio
    GenerateAudio,
}

impl UsageAction {
    /// All metered actions
    pub const ALL: [UsageAction; 3] = [Self::CreateStory, Self::Download, Self::GenerateAudio];

    /// Stable metric name, also used as the database column prefix
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateStory => "stories",
            Self::Download => "downloads",
            Self::GenerateAudio => "audio",
        }
    }
}

impl std::fmt::Display for UsageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UsageAction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stories" | "create_story" => Ok(Self::CreateStory),
            "downloads" | "download" => Ok(Self::Download),
            "audio" | "generate_audio" => Ok(Self::GenerateAudio),
            _ => Err(TypeError::InvalidAction(s.to_string())),
        }
    }
}

/// A usage limit for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many per period
    Limited(u32),
    /// No limit; usage is not counted
    Unlimited,
}

impl Limit {
    /// Whether one more action is allowed after `used` actions
    pub const fn allows(&self, used: u32) -> bool {
        match self {
            Self::Limited(max) => used < *max,
            Self::Unlimited => true,
        }
    }

    /// The numeric cap, `None` when unlimited
    pub const fn as_option(&self) -> Option<u32> {
        match self {
            Self::Limited(max) => Some(*max),
            Self::Unlimited => None,
        }
    }

    /// Remaining actions, `None` when unlimited
    pub const fn remaining(&self, used: u32) -> Option<u32> {
        match self {
            Self::Limited(max) => Some(max.saturating_sub(used)),
            Self::Unlimited => None,
        }
    }
}

impl std::str::FromStr for Limit {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::Unlimited);
        }
        s.parse::<u32>()
            .map(Self::Limited)
            .map_err(|_| TypeError::InvalidLimit(s.to_string()))
    }
}

impl Serialize for Limit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// Limits for every action of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    pub stories: Limit,
    pub downloads: Limit,
    pub audio: Limit,
}

impl TierLimits {
    /// Limit for an action
    pub const fn get(&self, action: UsageAction) -> Limit {
        match action {
            UsageAction::CreateStory => self.stories,
            UsageAction::Download => self.downloads,
            UsageAction::GenerateAudio => self.audio,
        }
    }

    fn set(&mut self, action: UsageAction, limit: Limit) {
        match action {
            UsageAction::CreateStory => self.stories = limit,
            UsageAction::Download => self.downloads = limit,
            UsageAction::GenerateAudio => self.audio = limit,
        }
    }
}

/// Per-tier usage limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLimits {
    pub free: TierLimits,
    pub basic: TierLimits,
    pub premium: TierLimits,
    pub enterprise: TierLimits,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            free: TierLimits {
                stories: Limit::Limited(10),
                downloads: Limit::Limited(5),
                audio: Limit::Limited(3),
            },
            basic: TierLimits {
                stories: Limit::Limited(30),
                downloads: Limit::Unlimited,
                audio: Limit::Limited(15),
            },
            premium: TierLimits {
                stories: Limit::Limited(100),
                downloads: Limit::Unlimited,
                audio: Limit::Limited(50),
            },
            enterprise: TierLimits {
                stories: Limit::Limited(500),
                downloads: Limit::Unlimited,
                audio: Limit::Limited(200),
            },
        }
    }
}

impl UsageLimits {
    /// Limits for a tier
    pub const fn for_tier(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Free => self.free,
            Tier::Basic => self.basic,
            Tier::Premium => self.premium,
            Tier::Enterprise => self.enterprise,
        }
    }

    /// Override one limit
    #[must_use]
    pub fn with_limit(mut self, tier: Tier, action: UsageAction, limit: Limit) -> Self {
        let limits = match tier {
            Tier::Free => &mut self.free,
            Tier::Basic => &mut self.basic,
            Tier::Premium => &mut self.premium,
            Tier::Enterprise => &mut self.enterprise,
        };
        limits.set(action, limit);
        self
    }
}

/// Counts consumed by a user in one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub stories_count: u32,
    pub downloads_count: u32,
    pub audio_count: u32,
}

impl UsageCounters {
    /// Count for an action
    pub const fn get(&self, action: UsageAction) -> u32 {
        match action {
            UsageAction::CreateStory => self.stories_count,
            UsageAction::Download => self.downloads_count,
            UsageAction::GenerateAudio => self.audio_count,
        }
    }
}

/// Counters of a user together with the limits of their tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Billing period (`YYYY-MM`)
    pub period: String,
    /// Effective tier
    pub tier: Tier,
    /// Counts for the period
    pub counters: UsageCounters,
    /// Limits of the tier
    pub limits: TierLimits,
}

impl UsageSnapshot {
    /// Whether the action is currently allowed
    pub fn can(&self, action: UsageAction) -> bool {
        self.limits.get(action).allows(self.counters.get(action))
    }

    pub fn can_create_story(&self) -> bool {
        self.can(UsageAction::CreateStory)
    }

    pub fn can_download(&self) -> bool {
        self.can(UsageAction::Download)
    }

    pub fn can_generate_audio(&self) -> bool {
        self.can(UsageAction::GenerateAudio)
    }

    /// Remaining actions, `None` when unlimited
    pub fn remaining(&self, action: UsageAction) -> Option<u32> {
        self.limits.get(action).remaining(self.counters.get(action))
    }
}

/// Billing period key (`YYYY-MM`, UTC) for a point in time
pub fn usage_period(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn snapshot(tier: Tier, counters: UsageCounters) -> UsageSnapshot {
        UsageSnapshot {
            period: "2026-10".to_string(),
            tier,
            counters,
            limits: UsageLimits::default().for_tier(tier),
        }
    }

    #[test]
    fn test_free_user_at_story_limit_cannot_create() {
        let snap = snapshot(
            Tier::Free,
            UsageCounters {
                stories_count: 10,
                ..Default::default()
            },
        );
        assert!(!snap.can_create_story());
        assert_eq!(snap.remaining(UsageAction::CreateStory), Some(0));
    }

    #[test]
    fn test_paid_downloads_are_unlimited() {
        let snap = snapshot(
            Tier::Premium,
            UsageCounters {
                downloads_count: 10_000,
                ..Default::default()
            },
        );
        assert!(snap.can_download());
        assert_eq!(snap.remaining(UsageAction::Download), None);
    }

    #[test]
    fn test_paid_limits_are_larger_or_unbounded() {
        let limits = UsageLimits::default();
        let free = limits.for_tier(Tier::Free);
        for tier in [Tier::Basic, Tier::Premium, Tier::Enterprise] {
            let paid = limits.for_tier(tier);
            for action in UsageAction::ALL {
                match (free.get(action), paid.get(action)) {
                    (Limit::Limited(f), Limit::Limited(p)) => assert!(p > f),
                    (_, Limit::Unlimited) => {}
                    (Limit::Unlimited, Limit::Limited(_)) => panic!("free unbounded but paid capped"),
                }
            }
        }
    }

    #[test]
    fn test_limit_parse() {
        assert_eq!("12".parse::<Limit>().unwrap(), Limit::Limited(12));
        assert_eq!("Unlimited".parse::<Limit>().unwrap(), Limit::Unlimited);
        assert!("-1".parse::<Limit>().is_err());
    }

    #[test]
    fn test_with_limit_override() {
        let limits =
            UsageLimits::default().with_limit(Tier::Free, UsageAction::GenerateAudio, Limit::Limited(1));
        assert_eq!(limits.free.audio, Limit::Limited(1));
        assert_eq!(limits.free.stories, Limit::Limited(10));
    }

    #[test]
    fn test_limit_serializes_as_nullable_number() {
        assert_eq!(serde_json::to_string(&Limit::Limited(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Limit::Unlimited).unwrap(), "null");
    }

    #[test]
    fn test_usage_period_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(usage_period(at), "2026-03");
    }

    proptest! {
        #[test]
        fn prop_limited_allows_iff_below_cap(max in 0u32..1_000, used in 0u32..2_000) {
            let limit = Limit::Limited(max);
            prop_assert_eq!(limit.allows(used), used < max);
            prop_assert_eq!(limit.remaining(used), Some(max.saturating_sub(used)));
        }
    }
}
