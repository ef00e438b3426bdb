use serde::Serialize;
use strum::Display;
use tracing::info;

use crate::domain::{Alert, AlertConfig, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

/// Delivery seam. The shipped implementation only logs.
pub trait Notifier: Send + Sync {
    fn send(&self, channel: Channel, alert: &Alert, recipients: &[String]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, channel: Channel, alert: &Alert, recipients: &[String]) {
        info!(
            %channel,
            alert_id = %alert.id,
            severity = %alert.severity,
            recipients = recipients.len(),
            title = %alert.title,
            "alert notification sent"
        );
    }
}

/// Fan an alert out to the enabled channels. Alerts below `min_severity` are
/// not sent anywhere. Returns the channels used.
pub fn dispatch(
    notifier: &dyn Notifier,
    config: &AlertConfig,
    subscriptions: &[Subscription],
    alert: &Alert,
) -> Vec<Channel> {
    if alert.severity < config.min_severity {
        return Vec::new();
    }
    let mut used = Vec::new();

    if config.email_enabled {
        let mut recipients = config.email_recipients.clone();
        recipients.extend(
            subscriptions
                .iter()
                .filter(|s| s.types.contains(&alert.alert_type))
                .map(|s| s.email.clone())
                .filter(|e| !config.email_recipients.contains(e)),
        );
        if !recipients.is_empty() {
            notifier.send(Channel::Email, alert, &recipients);
            used.push(Channel::Email);
        }
    }
    if config.sms_enabled && !config.sms_recipients.is_empty() {
        notifier.send(Channel::Sms, alert, &config.sms_recipients);
        used.push(Channel::Sms);
    }
    if config.push_enabled {
        notifier.send(Channel::Push, alert, &[]);
        used.push(Channel::Push);
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertSeverity, AlertType};
    use chrono::Utc;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(Channel, Vec<String>)>>);

    impl Notifier for Recording {
        fn send(&self, channel: Channel, _alert: &Alert, recipients: &[String]) {
            self.0.lock().push((channel, recipients.to_vec()));
        }
    }

    fn alert(severity: AlertSeverity) -> Alert {
        Alert {
            id: "ALT-1".into(),
            alert_type: AlertType::PeakDemand,
            severity,
            title: "t".into(),
            message: "m".into(),
            recommendation: String::new(),
            timestamp: Utc::now(),
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }

    fn subscriber(email: &str, types: Vec<AlertType>) -> Subscription {
        Subscription {
            email: email.into(),
            types,
            subscribed_at: Utc::now(),
        }
    }

    #[test]
    fn below_min_severity_is_suppressed() {
        let n = Recording::default();
        let used = dispatch(&n, &AlertConfig::default(), &[], &alert(AlertSeverity::Info));
        assert!(used.is_empty());
        assert!(n.0.lock().is_empty());
    }

    #[test]
    fn email_goes_to_recipients_and_matching_subscribers() {
        let n = Recording::default();
        let config = AlertConfig {
            email_recipients: vec!["ops@example.org".into()],
            ..AlertConfig::default()
        };
        let subs = vec![
            subscriber("a@example.org", vec![AlertType::PeakDemand]),
            subscriber("b@example.org", vec![AlertType::Weather]),
            subscriber("ops@example.org", vec![AlertType::PeakDemand]),
        ];
        let used = dispatch(&n, &config, &subs, &alert(AlertSeverity::Critical));
        assert_eq!(used, vec![Channel::Email, Channel::Push]);
        let sent = n.0.lock();
        assert_eq!(sent[0].1, vec!["ops@example.org".to_string(), "a@example.org".to_string()]);
    }

    #[test]
    fn sms_needs_recipients() {
        let n = Recording::default();
        let config = AlertConfig {
            sms_enabled: true,
            push_enabled: false,
            email_enabled: false,
            ..AlertConfig::default()
        };
        assert!(dispatch(&n, &config, &[], &alert(AlertSeverity::Emergency)).is_empty());
    }
}
