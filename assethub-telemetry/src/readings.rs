use chrono::{DateTime, DurationRound, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const FIELD_SEPARATOR: char = ';';

/// A single load sample read from the asset. Negative load is consumption.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetReading {
    pub timestamp: DateTime<Utc>,
    pub load: f64,
}

#[derive(Debug, Error)]
pub enum ReadingsError {
    #[error("line {line}: expected '<yyyyMMddHHmmss>;<load>', got '{content}'")]
    Format { line: usize, content: String },

    #[error("line {line}: invalid timestamp: {source}")]
    Timestamp {
        line: usize,
        #[source]
        source: chrono::ParseError,
    },

    #[error("line {line}: invalid load: {source}")]
    Load {
        line: usize,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("line {line}: load must be a finite number, got '{content}'")]
    NonFinite { line: usize, content: String },

    #[error("no readings found")]
    Empty,
}

/// Parse readings, one `<yyyyMMddHHmmss>;<load>` sample per line.
///
/// Timestamps are UTC. Blank lines are skipped, but at least one reading
/// must be present.
pub fn parse_readings(input: &str) -> Result<Vec<AssetReading>, ReadingsError> {
    let mut readings = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }

        let (timestamp, load) =
            content
                .split_once(FIELD_SEPARATOR)
                .ok_or_else(|| ReadingsError::Format {
                    line,
                    content: content.to_owned(),
                })?;

        let timestamp = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
            .map_err(|source| ReadingsError::Timestamp { line, source })?
            .and_utc();
        let raw_load = load.trim();
        let load = raw_load
            .parse::<f64>()
            .map_err(|source| ReadingsError::Load { line, source })?;
        if !load.is_finite() {
            return Err(ReadingsError::NonFinite {
                line,
                content: raw_load.to_owned(),
            });
        }

        readings.push(AssetReading { timestamp, load });
    }

    if readings.is_empty() {
        return Err(ReadingsError::Empty);
    }

    debug!("parsed {} readings", readings.len());
    Ok(readings)
}

/// Average readings into one-minute buckets.
///
/// Buckets keep the order in which their minute first appears in
/// `readings`, and are stamped at the start of their minute.
pub fn aggregate_per_minute(readings: &[AssetReading]) -> Vec<AssetReading> {
    // (minute, sum, count)
    let mut buckets: Vec<(DateTime<Utc>, f64, usize)> = Vec::new();

    for reading in readings {
        let minute = truncate_to_minute(reading.timestamp);
        match buckets.iter_mut().find(|(m, _, _)| *m == minute) {
            Some((_, sum, count)) => {
                *sum += reading.load;
                *count += 1;
            }
            None => buckets.push((minute, reading.load, 1)),
        }
    }

    let aggregated: Vec<AssetReading> = buckets
        .into_iter()
        .map(|(timestamp, sum, count)| AssetReading {
            timestamp,
            load: sum / count as f64,
        })
        .collect();

    debug!("aggregated {} readings", aggregated.len());
    aggregated
}

fn truncate_to_minute(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    // only fails for timestamps near the representable limits, where the
    // original value is the best answer we have
    timestamp
        .duration_trunc(TimeDelta::minutes(1))
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 16, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_readings() {
        let input = "20201016074900;27.0\n\n20201016074930;-1.5\n";
        let readings = parse_readings(input).unwrap();

        assert_eq!(
            readings,
            vec![
                AssetReading {
                    timestamp: at(7, 49, 0),
                    load: 27.0
                },
                AssetReading {
                    timestamp: at(7, 49, 30),
                    load: -1.5
                },
            ]
        );
    }

    #[test]
    fn test_parse_readings_reports_line_of_missing_separator() {
        let input = "20201016074900;27.0\n20201016074930 -1.5";
        let err = parse_readings(input).unwrap_err();

        assert!(matches!(err, ReadingsError::Format { line: 2, .. }));
    }

    #[test]
    fn test_parse_readings_rejects_bad_timestamp() {
        let err = parse_readings("2020-10-16;1.0").unwrap_err();
        assert!(matches!(err, ReadingsError::Timestamp { line: 1, .. }));
    }

    #[test]
    fn test_parse_readings_rejects_bad_load() {
        let err = parse_readings("20201016074900;lots").unwrap_err();
        assert!(matches!(err, ReadingsError::Load { line: 1, .. }));
    }

    #[test]
    fn test_parse_readings_rejects_non_finite_load() {
        for load in ["NaN", "inf", "-infinity"] {
            let input = format!("20201016074900;1.0\n20201016074930;{load}");
            let err = parse_readings(&input).unwrap_err();
            assert!(
                matches!(err, ReadingsError::NonFinite { line: 2, ref content } if content == load),
                "unexpected error for {load}: {err}"
            );
        }
    }

    #[test]
    fn test_parse_readings_rejects_blank_input() {
        assert!(matches!(parse_readings(""), Err(ReadingsError::Empty)));
        assert!(matches!(parse_readings("\n  \n"), Err(ReadingsError::Empty)));
    }

    #[test]
    fn test_aggregate_averages_per_minute_in_first_seen_order() {
        let readings = vec![
            AssetReading {
                timestamp: at(7, 50, 10),
                load: 4.0,
            },
            AssetReading {
                timestamp: at(7, 49, 5),
                load: 1.0,
            },
            AssetReading {
                timestamp: at(7, 50, 40),
                load: 2.0,
            },
            AssetReading {
                timestamp: at(7, 49, 59),
                load: -3.0,
            },
        ];

        let aggregated = aggregate_per_minute(&readings);

        assert_eq!(
            aggregated,
            vec![
                AssetReading {
                    timestamp: at(7, 50, 0),
                    load: 3.0
                },
                AssetReading {
                    timestamp: at(7, 49, 0),
                    load: -1.0
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_per_minute(&[]).is_empty());
    }
}
