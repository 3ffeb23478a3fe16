use chrono::{DateTime, TimeDelta, Utc};
use serde::{Serialize, Serializer};

use crate::readings::AssetReading;

/// The metering sample sent when no readings are provided
pub const DEFAULT_TELEMETRY: &str = r#"{"PeriodFrom":"2020-10-16T07:49:00Z","PeriodTo":"2020-10-16T07:50:00Z","AveragePowerConsumptionInKW":0.0,"AveragePowerGenerationInKW":27.0}"#;

const PERIOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Average power over a metering period
///
/// Field order and names are part of the wire format expected by the hub
/// consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeteredValue {
    #[serde(rename = "PeriodFrom", serialize_with = "serialize_period")]
    pub period_from: DateTime<Utc>,

    #[serde(rename = "PeriodTo", serialize_with = "serialize_period")]
    pub period_to: DateTime<Utc>,

    #[serde(rename = "AveragePowerConsumptionInKW")]
    pub average_power_consumption_kw: f64,

    #[serde(rename = "AveragePowerGenerationInKW")]
    pub average_power_generation_kw: f64,
}

impl MeteredValue {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn serialize_period<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(PERIOD_FORMAT))
}

/// Turn one-minute readings into metering samples.
///
/// A positive load is generation, anything else is consumption.
pub fn to_metered_values(readings: &[AssetReading]) -> Vec<MeteredValue> {
    readings
        .iter()
        .map(|reading| {
            let load = reading.load;
            MeteredValue {
                period_from: reading.timestamp,
                period_to: reading.timestamp + TimeDelta::minutes(1),
                average_power_consumption_kw: if load < 0.0 { -load } else { 0.0 },
                average_power_generation_kw: if load > 0.0 { load } else { 0.0 },
            }
        })
        .collect()
}
