//! Configuration for the query cache

use crate::keys::{EntityFamily, QueryKey, Scope};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stale time override for one `(family, scope)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleTimeRule {
    pub family: EntityFamily,

    /// `None` matches every scope of the family
    pub scope: Option<Scope>,

    pub stale_time: Duration,
}

impl StaleTimeRule {
    pub fn new(family: EntityFamily, scope: Option<Scope>, stale_time: Duration) -> Self {
        Self {
            family,
            scope,
            stale_time,
        }
    }

    fn matches(&self, family: EntityFamily, scope: Option<Scope>) -> bool {
        self.family == family && (self.scope.is_none() || self.scope == scope)
    }
}

/// Configuration for the query cache
///
/// Stale time is a property of a key's `(family, scope)`, never of an
/// individual call site: two readers of the same key always agree on whether
/// it is fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Stale time for keys no rule matches
    pub default_stale_time: Duration,

    /// Per-scope overrides; a rule naming a scope wins over a family-wide rule
    pub stale_times: Vec<StaleTimeRule>,

    /// How long an unobserved entry is kept after its last use
    pub gc_time: Duration,

    /// Enable the periodic garbage collection task
    pub enable_auto_gc: bool,

    /// Interval between garbage collection passes
    pub gc_interval: Duration,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let minutes = |m: u64| Duration::from_secs(m * 60);
        Self {
            default_stale_time: minutes(5),
            stale_times: vec![
                StaleTimeRule::new(EntityFamily::Notifications, Some(Scope::Unread), minutes(2)),
                StaleTimeRule::new(EntityFamily::Notifications, Some(Scope::List), minutes(2)),
                StaleTimeRule::new(EntityFamily::Jobs, Some(Scope::Recommendations), minutes(15)),
                StaleTimeRule::new(EntityFamily::Jobs, Some(Scope::Stats), minutes(10)),
                StaleTimeRule::new(EntityFamily::Applications, Some(Scope::Stats), minutes(10)),
                StaleTimeRule::new(EntityFamily::SavedJobs, Some(Scope::Stats), minutes(10)),
                StaleTimeRule::new(EntityFamily::SavedJobs, Some(Scope::Analytics), minutes(10)),
            ],
            gc_time: minutes(30),
            enable_auto_gc: true,
            gc_interval: minutes(5),
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.gc_interval.is_zero() && self.enable_auto_gc {
            return Err("gc_interval must be greater than 0 when auto gc is enabled".to_string());
        }

        for (i, rule) in self.stale_times.iter().enumerate() {
            if let Some(scope) = rule.scope {
                if !scope.allowed_for(rule.family) {
                    return Err(format!(
                        "stale time rule {} names scope `{}` which does not exist for `{}`",
                        i, scope, rule.family
                    ));
                }
            }
            if self.stale_times[..i]
                .iter()
                .any(|other| other.family == rule.family && other.scope == rule.scope)
            {
                return Err(format!(
                    "duplicate stale time rule for {}/{:?}",
                    rule.family, rule.scope
                ));
            }
        }

        Ok(())
    }

    /// Stale time for a key, looked up by its family and scope only
    pub fn stale_time_for(&self, key: &QueryKey) -> Duration {
        let family = key.entity_family();
        let scope = key.scope();

        self.stale_times
            .iter()
            .filter(|rule| rule.matches(family, scope))
            .max_by_key(|rule| rule.scope.is_some())
            .map(|rule| rule.stale_time)
            .unwrap_or(self.default_stale_time)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_stale_time: Option<Duration>,
    stale_times: Vec<StaleTimeRule>,
    gc_time: Option<Duration>,
    enable_auto_gc: Option<bool>,
    gc_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set the fallback stale time
    pub fn default_stale_time(mut self, stale_time: Duration) -> Self {
        self.default_stale_time = Some(stale_time);
        self
    }

    /// Override the stale time of one scope
    pub fn stale_time(mut self, family: EntityFamily, scope: Scope, stale_time: Duration) -> Self {
        self.stale_times
            .push(StaleTimeRule::new(family, Some(scope), stale_time));
        self
    }

    /// Override the stale time of a whole family
    pub fn family_stale_time(mut self, family: EntityFamily, stale_time: Duration) -> Self {
        self.stale_times
            .push(StaleTimeRule::new(family, None, stale_time));
        self
    }

    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = Some(gc_time);
        self
    }

    /// Enable or disable the periodic gc task
    pub fn enable_auto_gc(mut self, enable: bool) -> Self {
        self.enable_auto_gc = Some(enable);
        self
    }

    pub fn gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    ///
    /// Rules given to the builder replace the default rule for the same
    /// `(family, scope)`; other default rules are kept.
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        let mut stale_times: Vec<StaleTimeRule> = defaults
            .stale_times
            .into_iter()
            .filter(|rule| {
                !self
                    .stale_times
                    .iter()
                    .any(|o| o.family == rule.family && o.scope == rule.scope)
            })
            .collect();
        for rule in self.stale_times {
            stale_times.retain(|r| !(r.family == rule.family && r.scope == rule.scope));
            stale_times.push(rule);
        }

        CacheConfig {
            default_stale_time: self
                .default_stale_time
                .unwrap_or(defaults.default_stale_time),
            stale_times,
            gc_time: self.gc_time.unwrap_or(defaults.gc_time),
            enable_auto_gc: self.enable_auto_gc.unwrap_or(defaults.enable_auto_gc),
            gc_interval: self.gc_interval.unwrap_or(defaults.gc_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations
impl CacheConfig {
    /// Everything goes stale immediately; every read revalidates
    pub fn realtime() -> Self {
        Self {
            default_stale_time: Duration::ZERO,
            stale_times: Vec::new(),
            gc_time: Duration::from_secs(5 * 60),
            ..Default::default()
        }
    }

    /// Long stale times for slow-moving data or constrained networks
    pub fn conservative() -> Self {
        Self {
            default_stale_time: Duration::from_secs(15 * 60),
            stale_times: vec![StaleTimeRule::new(
                EntityFamily::Notifications,
                None,
                Duration::from_secs(5 * 60),
            )],
            gc_time: Duration::from_secs(60 * 60),
            ..Default::default()
        }
    }

    /// No background task; gc only runs when asked. Used by tests.
    pub fn manual_gc(gc_time: Duration) -> Self {
        Self {
            gc_time,
            enable_auto_gc: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::model::NotificationFilter;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_stale_time, Duration::from_secs(300));
        assert_eq!(config.gc_time, Duration::from_secs(1800));
        assert!(config.enable_auto_gc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stale_time_per_scope() {
        let config = CacheConfig::default();

        assert_eq!(
            config.stale_time_for(&keys::notifications::unread()),
            Duration::from_secs(120)
        );
        assert_eq!(
            config.stale_time_for(&keys::notifications::list(&NotificationFilter::default())),
            Duration::from_secs(120)
        );
        assert_eq!(
            config.stale_time_for(&keys::jobs::recommendations()),
            Duration::from_secs(900)
        );
        assert_eq!(
            config.stale_time_for(&keys::jobs::detail("J1")),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_stale_time_ignores_discriminators() {
        let config = CacheConfig::default();
        assert_eq!(
            config.stale_time_for(&keys::jobs::detail("J1")),
            config.stale_time_for(&keys::jobs::detail("J2"))
        );
    }

    #[test]
    fn test_scope_rule_beats_family_rule() {
        let config = CacheConfig::builder()
            .family_stale_time(EntityFamily::Jobs, Duration::from_secs(30))
            .stale_time(EntityFamily::Jobs, Scope::Stats, Duration::from_secs(90))
            .build();

        assert_eq!(config.stale_time_for(&keys::jobs::stats()), Duration::from_secs(90));
        assert_eq!(
            config.stale_time_for(&keys::jobs::detail("J1")),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_builder_overrides_default_rule() {
        let config = CacheConfig::builder()
            .stale_time(EntityFamily::Notifications, Scope::Unread, Duration::from_secs(5))
            .gc_time(Duration::from_secs(60))
            .build();

        assert_eq!(
            config.stale_time_for(&keys::notifications::unread()),
            Duration::from_secs(5)
        );
        assert_eq!(config.gc_time, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CacheConfig::default();
        config.stale_times.push(StaleTimeRule::new(
            EntityFamily::Dashboard,
            Some(Scope::Detail),
            Duration::from_secs(1),
        ));
        assert!(config.validate().is_err());

        let mut config = CacheConfig::default();
        config.gc_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = CacheConfig::default();
        let dup = config.stale_times[0];
        config.stale_times.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_configs() {
        let realtime = CacheConfig::realtime();
        assert_eq!(realtime.stale_time_for(&keys::jobs::stats()), Duration::ZERO);

        let conservative = CacheConfig::conservative();
        assert_eq!(
            conservative.stale_time_for(&keys::notifications::unread()),
            Duration::from_secs(300)
        );
        assert!(conservative.validate().is_ok());

        assert!(!CacheConfig::manual_gc(Duration::from_secs(1)).enable_auto_gc);
    }
}
