/*
Telemetry payloads the device sends to its hub.

By default a device sends a single fixed metering sample. When readings
from the asset are available, they are averaged into one-minute periods
and each period becomes a metering sample of its own.
*/

mod metered;
mod readings;

pub use metered::{DEFAULT_TELEMETRY, MeteredValue, to_metered_values};
pub use readings::{AssetReading, ReadingsError, aggregate_per_minute, parse_readings};
