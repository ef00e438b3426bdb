//! Keyword-driven assistant for the dashboard chat panel.
//!
//! Intents are tried in declaration order and the first keyword hit wins, so
//! "consumption" routes to analytics even though households also lists it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Forecast,
    Realtime,
    Regions,
    Analytics,
    Households,
    Help,
    General,
}

impl Intent {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Intent::Forecast => &[
                "demand forecast",
                "predict demand",
                "next 24 hours",
                "peak demand",
                "electricity prediction",
                "load forecast",
                "demand prediction",
            ],
            Intent::Realtime => &[
                "current demand",
                "grid status",
                "real-time",
                "current load",
                "power plants",
                "generation",
                "frequency",
                "voltage",
            ],
            Intent::Regions => &[
                "addis ababa",
                "oromia",
                "amhara",
                "tigray",
                "snnpr",
                "somali",
                "afar",
                "benishangul",
                "gambela",
                "harari",
                "dire dawa",
            ],
            Intent::Analytics => &[
                "analytics",
                "statistics",
                "average demand",
                "peak hour",
                "consumption",
                "energy usage",
                "demand pattern",
            ],
            Intent::Households => &[
                "household",
                "consumption",
                "appliances",
                "usage",
                "residential",
                "home energy",
            ],
            Intent::Help => &[
                "help",
                "how to",
                "guide",
                "tutorial",
                "what can you do",
                "features",
                "commands",
            ],
            Intent::General => &[],
        }
    }
}

pub fn classify(message: &str) -> Intent {
    let msg = message.to_lowercase();
    Intent::iter()
        .find(|intent| intent.keywords().iter().any(|k| msg.contains(k)))
        .unwrap_or(Intent::General)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatMessage {
    #[validate(custom(function = "not_blank"))]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<u64>,
}

fn not_blank(s: &str) -> Result<(), validator::ValidationError> {
    if s.trim().is_empty() {
        return Err(validator::ValidationError::new("Message cannot be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
    pub suggestions: Vec<&'static str>,
}

/// Live figures a reply may quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatContext {
    pub forecast_peak_mw: f64,
    pub forecast_peak_hour: u32,
}

pub const SUGGESTIONS: [&str; 7] = [
    "What's the current demand?",
    "Show 24-hour forecast",
    "Peak demand today",
    "Real-time grid status",
    "Regional demand breakdown",
    "How do I add a household?",
    "Help",
];

pub fn respond(message: &str, ctx: &ChatContext, now: DateTime<Utc>) -> ChatReply {
    let intent = classify(message);
    let msg = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| msg.contains(w));

    let (response, suggestions): (String, &[&'static str]) = match intent {
        Intent::Forecast => {
            let text = if has(&["peak"]) {
                format!(
                    "Peak demand typically occurs between 18:00-21:00 (evening peak). \
                     The current 24-hour forecast peaks at {:.0} MW around {:02}:00. \
                     Would you like to see the detailed 24-hour forecast?",
                    ctx.forecast_peak_mw, ctx.forecast_peak_hour
                )
            } else if has(&["next", "tomorrow"]) {
                "I can show you the forecast for the next 24 hours or 7 days. \
                 Go to the Forecast page to see detailed predictions with temperature impact analysis."
                    .to_string()
            } else {
                format!(
                    "I can help you with demand forecasting! The next 24 hours peak at {:.0} MW. \
                     Ask me about peak demand, next 24 hours, or forecast accuracy.",
                    ctx.forecast_peak_mw
                )
            };
            (
                text,
                &["Show 24h forecast", "Peak demand today", "Forecast accuracy"],
            )
        }
        Intent::Realtime => {
            let text = if has(&["power plant", "generation"]) {
                "Ethiopia has 13 major power plants: GERD (5,150 MW), Gilgel Gibe III (1,870 MW), \
                 and others. Check the Real-time page for live status of all plants."
            } else if has(&["frequency", "voltage"]) {
                "Grid frequency should be around 50 Hz. Voltage levels: 230kV, 132kV, 66kV. \
                 See Real-time page for current values."
            } else if has(&["region"]) {
                "Demand varies by region. Addis Ababa has the highest demand. \
                 Check the Real-time page for regional breakdown."
            } else {
                "Real-time grid information available! Ask about power plants, frequency, \
                 voltage, or regional demand."
            };
            (
                text.to_string(),
                &["Current grid status", "Power plants", "Regional demand"],
            )
        }
        Intent::Regions => {
            let text = if has(&["addis"]) {
                "Addis Ababa: ~1,200 MW average demand, 4.2M population, 850K households. \
                 Highest demand in Ethiopia."
            } else if has(&["oromia"]) {
                "Oromia: ~800 MW average demand, 6M population, 1.2M households. \
                 Second largest region."
            } else {
                "Ethiopia has 11 regions with varying electricity demand. \
                 Addis Ababa leads with ~1,200 MW. Check Analytics for regional breakdown."
            };
            (
                text.to_string(),
                &["Addis Ababa demand", "Regional comparison", "Population served"],
            )
        }
        Intent::Analytics => {
            let text = if has(&["average", "mean"]) {
                "Average national demand: ~3,680 MW. Varies by hour and season. \
                 Check Analytics page for detailed statistics."
            } else if has(&["peak", "hour"]) {
                "Peak hours: 18:00-21:00 (evening peak). Minimum: 04:00-05:00 (night low). \
                 See Analytics for hourly breakdown."
            } else {
                "Analytics show demand patterns and trends. \
                 Ask about average demand, peak hours, or consumption."
            };
            (
                text.to_string(),
                &["Average demand", "Peak hours", "Consumption trends"],
            )
        }
        Intent::Households => {
            let text = if has(&["add", "create", "register"]) {
                "You can register households in the Households page. \
                 Provide name, region, people, rooms and appliances to get a monthly estimate."
            } else if has(&["consumption", "usage"]) {
                "Consumption depends on appliances and usage patterns. \
                 AC, heater and EV charging increase demand significantly."
            } else {
                "Household management available! Register households, track consumption \
                 and get recommendations."
            };
            (
                text.to_string(),
                &["Add household", "Consumption estimate", "Appliances"],
            )
        }
        Intent::Help => (
            "I'm the assistant for Ethiopian Electric Utility. I can help with:\n\n\
             - Dashboard: current demand overview\n\
             - Forecast: 24h and 7-day predictions\n\
             - Analytics: demand statistics and patterns\n\
             - Real-time: live grid status\n\
             - Households: manage your consumption\n\
             - AI Insights: smart recommendations\n\n\
             Ask me about forecasts, grid status, regions, or anything electricity-related!"
                .to_string(),
            &["Dashboard", "Forecast", "Analytics", "Real-time"],
        ),
        Intent::General => (
            "I'm here to help with electricity demand forecasting! Ask me about:\n\
             - Demand forecasts\n\
             - Real-time grid status\n\
             - Regional demand\n\
             - Household consumption\n\
             - Analytics and trends\n\n\
             Or type 'help' for more information."
                .to_string(),
            &["Dashboard", "Forecast", "Real-time", "Help"],
        ),
    };

    ChatReply {
        response,
        intent,
        timestamp: now,
        suggestions: suggestions.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const CTX: ChatContext = ChatContext {
        forecast_peak_mw: 4480.4,
        forecast_peak_hour: 19,
    };

    #[rstest]
    #[case("Show me the demand forecast", Intent::Forecast)]
    #[case("What is the PEAK DEMAND today?", Intent::Forecast)]
    #[case("grid status please", Intent::Realtime)]
    #[case("tell me about Oromia", Intent::Regions)]
    #[case("monthly consumption", Intent::Analytics)]
    #[case("my appliances", Intent::Households)]
    #[case("what can you do", Intent::Help)]
    #[case("hello there", Intent::General)]
    fn intents_follow_keyword_order(#[case] msg: &str, #[case] expected: Intent) {
        assert_eq!(classify(msg), expected);
    }

    #[test]
    fn forecast_peak_quotes_live_value() {
        let reply = respond("peak demand tomorrow?", &CTX, Utc::now());
        assert_eq!(reply.intent, Intent::Forecast);
        assert!(reply.response.contains("4480 MW"));
        assert!(reply.response.contains("19:00"));
        assert_eq!(reply.suggestions.len(), 3);
    }

    #[test]
    fn regional_detail_for_addis() {
        let reply = respond("addis ababa load", &CTX, Utc::now());
        assert!(reply.response.starts_with("Addis Ababa: ~1,200 MW"));
    }

    #[test]
    fn blank_messages_fail_validation() {
        let msg = ChatMessage {
            message: "   ".into(),
            user_id: None,
        };
        assert!(msg.validate().is_err());
    }
}
