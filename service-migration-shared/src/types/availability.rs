//! Canonical availability entries.
//!
//! Entries serialize with a `category` tag. Weekly and public-holiday times
//! are written as `HH:MM:SS` and read back from either `HH:MM:SS` or `HH:MM`.
//! Date overrides use local ISO-8601 timestamps without a timezone suffix.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    /// Resolves a legacy day name (`Monday`, `tuesday`, ...) by its first three letters.
    pub fn from_day_name(name: &str) -> Option<Self> {
        let prefix: String = name.trim().chars().take(3).collect::<String>().to_lowercase();
        match prefix.as_str() {
            "mon" => Some(Self::Mon),
            "tue" => Some(Self::Tue),
            "wed" => Some(Self::Wed),
            "thu" => Some(Self::Thu),
            "fri" => Some(Self::Fri),
            "sat" => Some(Self::Sat),
            "sun" => Some(Self::Sun),
            _ => None,
        }
    }
}

/// One scheduling fact for a healthcare service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum AvailabilityEntry {
    #[serde(rename = "availableTime", rename_all = "camelCase")]
    AvailableTime {
        day_of_week: DayOfWeek,
        #[serde(
            default,
            with = "clock_time::option",
            skip_serializing_if = "Option::is_none"
        )]
        start_time: Option<NaiveTime>,
        #[serde(
            default,
            with = "clock_time::option",
            skip_serializing_if = "Option::is_none"
        )]
        end_time: Option<NaiveTime>,
        all_day: bool,
    },
    #[serde(rename = "availableTimePublicHolidays", rename_all = "camelCase")]
    AvailableTimePublicHolidays {
        #[serde(with = "clock_time")]
        start_time: NaiveTime,
        #[serde(with = "clock_time")]
        end_time: NaiveTime,
    },
    #[serde(rename = "availableTimeVariations", rename_all = "camelCase")]
    AvailableTimeVariation {
        description: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    },
    #[serde(rename = "notAvailable", rename_all = "camelCase")]
    NotAvailable { date: NaiveDate, description: String },
}

impl AvailabilityEntry {
    /// A weekly session with explicit start and end times.
    pub fn available_time(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Self {
        Self::AvailableTime {
            day_of_week: day,
            start_time: Some(start),
            end_time: Some(end),
            all_day: false,
        }
    }

    /// A weekly session covering the whole day.
    pub fn all_day(day: DayOfWeek) -> Self {
        Self::AvailableTime {
            day_of_week: day,
            start_time: None,
            end_time: None,
            all_day: true,
        }
    }
}

mod clock_time {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M:%S";
    const SHORT_FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, SHORT_FORMAT))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}
