use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REGION: &str = "National";

/// One historical observation of grid demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    #[serde(rename = "datetime", with = "timestamp_format", default)]
    pub timestamp: Option<NaiveDateTime>,
    pub demand: f64,
    pub temperature: f64,
    pub hour: u32,
    pub day_of_week: u32,
    pub month: u32,
    pub humidity: f64,
    pub is_holiday: bool,
    pub region: String,
}

/// `YYYY-MM-DD HH:MM:SS` in CSV and JSON, empty when absent.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(v: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(ts) => s.serialize_str(&ts.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("unrecognised timestamp '{s}'"))
            }),
        }
    }

    /// Accepts a space or `T` separator, with or without seconds.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        const FORMATS: [&str; 4] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ];
        FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::timestamp_format::parse;

    #[test]
    fn parses_common_timestamp_shapes() {
        assert!(parse("2024-01-01 13:00:00").is_some());
        assert!(parse("2024-01-01T13:00").is_some());
        assert!(parse("2024-01-01").is_some());
        assert!(parse("01/01/2024").is_none());
    }
}
