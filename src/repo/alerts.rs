use chrono::{DateTime, Duration, NaiveTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::info;

use crate::alerts::AlertError;
use crate::domain::{Alert, AlertConfig, AlertSeverity, AlertType, NewAlert, Subscription};

pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<AlertSeverity>,
    pub alert_type: Option<AlertType>,
    pub acknowledged: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPage {
    pub alerts: Vec<Alert>,
    /// Matches before the limit was applied.
    pub total: usize,
    pub unacknowledged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentCounts {
    pub total: usize,
    pub emergency: usize,
    pub critical: usize,
    pub warning: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyCounts {
    pub total: usize,
    pub by_type: BTreeMap<AlertType, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub unacknowledged: usize,
    pub last_24h: RecentCounts,
    pub last_7d: WeeklyCounts,
    pub latest_alert: Option<Alert>,
}

#[derive(Debug, Default)]
struct AlertState {
    alerts: Vec<Alert>,
    config: AlertConfig,
    subscriptions: BTreeMap<String, Subscription>,
    seq: u64,
}

/// Process-lifetime alert log plus notification settings.
#[derive(Debug, Default)]
pub struct AlertStore {
    inner: RwLock<AlertState>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, new: NewAlert) -> Alert {
        self.insert_at(new, Utc::now())
    }

    pub fn insert_at(&self, new: NewAlert, at: DateTime<Utc>) -> Alert {
        let mut s = self.inner.write();
        s.seq += 1;
        let alert = Alert {
            id: format!("ALT-{}-{:04}", at.format("%Y%m%d%H%M%S"), s.seq),
            alert_type: new.alert_type,
            severity: new.severity,
            title: new.title,
            message: new.message,
            recommendation: new.recommendation,
            timestamp: at,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
        };
        s.alerts.push(alert.clone());
        info!(id = %alert.id, severity = %alert.severity, kind = %alert.alert_type, "alert raised");
        alert
    }

    /// Newest first.
    pub fn list(&self, filter: &AlertFilter) -> AlertPage {
        let s = self.inner.read();
        let mut matched: Vec<Alert> = s
            .alerts
            .iter()
            .filter(|a| filter.severity.map_or(true, |v| a.severity == v))
            .filter(|a| filter.alert_type.map_or(true, |v| a.alert_type == v))
            .filter(|a| filter.acknowledged.map_or(true, |v| a.acknowledged == v))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = matched.len();
        matched.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        AlertPage {
            alerts: matched,
            total,
            unacknowledged: s.alerts.iter().filter(|a| !a.acknowledged).count(),
        }
    }

    pub fn acknowledge(&self, id: &str, by: &str) -> Result<Alert, AlertError> {
        let mut s = self.inner.write();
        let alert = s
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AlertError::NotFound(id.to_string()))?;
        alert.acknowledged = true;
        alert.acknowledged_by = Some(by.to_string());
        alert.acknowledged_at = Some(Utc::now());
        Ok(alert.clone())
    }

    pub fn delete(&self, id: &str) -> Result<(), AlertError> {
        let mut s = self.inner.write();
        let before = s.alerts.len();
        s.alerts.retain(|a| a.id != id);
        if s.alerts.len() == before {
            return Err(AlertError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn summary(&self, now: DateTime<Utc>) -> AlertSummary {
        let s = self.inner.read();
        let day_ago = now - Duration::hours(24);
        let week_ago = now - Duration::days(7);
        let recent: Vec<&Alert> = s.alerts.iter().filter(|a| a.timestamp > day_ago).collect();
        let weekly: Vec<&Alert> = s.alerts.iter().filter(|a| a.timestamp > week_ago).collect();
        let count = |sev: AlertSeverity| recent.iter().filter(|a| a.severity == sev).count();

        AlertSummary {
            total_alerts: s.alerts.len(),
            unacknowledged: s.alerts.iter().filter(|a| !a.acknowledged).count(),
            last_24h: RecentCounts {
                total: recent.len(),
                emergency: count(AlertSeverity::Emergency),
                critical: count(AlertSeverity::Critical),
                warning: count(AlertSeverity::Warning),
            },
            last_7d: WeeklyCounts {
                total: weekly.len(),
                by_type: AlertType::iter()
                    .map(|t| (t, weekly.iter().filter(|a| a.alert_type == t).count()))
                    .collect(),
            },
            latest_alert: s.alerts.last().cloned(),
        }
    }

    pub fn config(&self) -> AlertConfig {
        self.inner.read().config.clone()
    }

    pub fn set_config(&self, config: AlertConfig) -> AlertConfig {
        self.inner.write().config = config.clone();
        config
    }

    /// Replaces an existing subscription for the same address. An empty type
    /// list subscribes to every type.
    pub fn subscribe(&self, email: &str, types: Vec<AlertType>) -> Subscription {
        let types = if types.is_empty() {
            AlertType::iter().collect()
        } else {
            types
        };
        let sub = Subscription {
            email: email.to_string(),
            types,
            subscribed_at: Utc::now(),
        };
        self.inner
            .write()
            .subscriptions
            .insert(sub.email.clone(), sub.clone());
        sub
    }

    pub fn unsubscribe(&self, email: &str) -> Result<Subscription, AlertError> {
        self.inner
            .write()
            .subscriptions
            .remove(email)
            .ok_or_else(|| AlertError::SubscriptionNotFound(email.to_string()))
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.read().subscriptions.values().cloned().collect()
    }

    /// Demonstration alerts so a fresh dashboard is not empty.
    pub fn seed_samples(&self, now: DateTime<Utc>) {
        let at = |h, m| {
            NaiveTime::from_hms_opt(h, m, 0)
                .map(|t| now.date_naive().and_time(t).and_utc())
                .unwrap_or(now)
        };
        let samples = [
            (
                at(19, 0),
                NewAlert::new(
                    AlertType::PeakDemand,
                    AlertSeverity::Warning,
                    "WARNING: Elevated Evening Demand",
                    "Evening peak demand reached 4,200 MW at 19:00",
                    "Monitor closely. Industrial users advised to reduce non-essential loads.",
                ),
            ),
            (
                at(8, 0),
                NewAlert::new(
                    AlertType::Maintenance,
                    AlertSeverity::Info,
                    "Scheduled Maintenance: Ashegoda Wind Farm",
                    "Ashegoda Wind Farm (120 MW) under scheduled maintenance",
                    "Capacity temporarily reduced. No action required.",
                ),
            ),
            (
                at(14, 30),
                NewAlert::new(
                    AlertType::Weather,
                    AlertSeverity::Info,
                    "Weather Advisory: Temperature Drop Expected",
                    "Temperature expected to drop 5°C tonight, may increase heating demand",
                    "Prepare additional generation capacity for morning peak.",
                ),
            ),
        ];
        for (ts, alert) in samples {
            self.insert_at(alert, ts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_alert(severity: AlertSeverity, kind: AlertType) -> NewAlert {
        NewAlert::new(kind, severity, "title", "message", "")
    }

    #[test]
    fn ids_are_unique_even_after_delete() {
        let store = AlertStore::new();
        let now = Utc::now();
        let a = store.insert_at(new_alert(AlertSeverity::Info, AlertType::Weather), now);
        store.delete(&a.id).unwrap();
        let b = store.insert_at(new_alert(AlertSeverity::Info, AlertType::Weather), now);
        assert_ne!(a.id, b.id);
        assert!(b.id.starts_with("ALT-"));
        assert!(b.id.ends_with("-0002"));
    }

    #[test]
    fn list_filters_sorts_and_limits() {
        let store = AlertStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store.insert_at(
                new_alert(AlertSeverity::Warning, AlertType::PeakDemand),
                now - Duration::minutes(i),
            );
        }
        store.insert_at(new_alert(AlertSeverity::Critical, AlertType::Forecast), now);

        let page = store.list(&AlertFilter {
            severity: Some(AlertSeverity::Warning),
            limit: Some(2),
            ..AlertFilter::default()
        });
        assert_eq!(page.total, 5);
        assert_eq!(page.alerts.len(), 2);
        assert!(page.alerts[0].timestamp >= page.alerts[1].timestamp);
        assert_eq!(page.unacknowledged, 6);
    }

    #[test]
    fn acknowledge_and_missing_ids() {
        let store = AlertStore::new();
        let a = store.insert(new_alert(AlertSeverity::Critical, AlertType::PeakDemand));
        let acked = store.acknowledge(&a.id, "operator").unwrap();
        assert!(acked.acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("operator"));
        assert_eq!(
            store.acknowledge("ALT-missing", "x"),
            Err(AlertError::NotFound("ALT-missing".into()))
        );
        assert!(store.delete("ALT-missing").is_err());
    }

    #[test]
    fn summary_windows() {
        let store = AlertStore::new();
        let now = Utc::now();
        store.insert_at(new_alert(AlertSeverity::Emergency, AlertType::PeakDemand), now);
        store.insert_at(
            new_alert(AlertSeverity::Warning, AlertType::Weather),
            now - Duration::days(3),
        );
        store.insert_at(
            new_alert(AlertSeverity::Critical, AlertType::Forecast),
            now - Duration::days(10),
        );
        let s = store.summary(now);
        assert_eq!(s.total_alerts, 3);
        assert_eq!(s.last_24h.total, 1);
        assert_eq!(s.last_24h.emergency, 1);
        assert_eq!(s.last_7d.total, 2);
        assert_eq!(s.last_7d.by_type[&AlertType::Weather], 1);
        assert_eq!(s.last_7d.by_type[&AlertType::Forecast], 0);
    }

    #[test]
    fn subscriptions_default_to_all_types() {
        let store = AlertStore::new();
        let sub = store.subscribe("a@example.org", vec![]);
        assert_eq!(sub.types.len(), 7);
        assert!(store.unsubscribe("a@example.org").is_ok());
        assert!(store.unsubscribe("a@example.org").is_err());
    }

    #[test]
    fn seeding_adds_three_samples() {
        let store = AlertStore::new();
        store.seed_samples(Utc::now());
        assert_eq!(store.list(&AlertFilter::default()).total, 3);
    }
}
