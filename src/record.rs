use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adjustment::{AdjustmentProfile, AdjustmentTable, Reading, adjust};

/// Identifiers shorter than a bare hardware address are treated as noise.
pub const MIN_DEVICE_ID_LEN: usize = 12;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTelemetry {
    #[serde(deserialize_with = "crate::adjustment::nullable_string")]
    pub mac: String,

    pub so2: Reading,
    pub no2: Reading,
    pub o3: Reading,
    pub hcho: Reading,
    pub co: Reading,
    pub temp: Reading,
    pub hum: Reading,
    pub pm2p5: Reading,
    pub pm10: Reading,
    pub tvoc: Reading,
    pub co2: Reading,
    pub pm100: Reading,
    pub c2h2: Reading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectedRecord {
    pub device: String,
    pub humidity: String,
    pub temperature: String,
    pub co: String,
    pub tvoc: String,
    pub pm2p5: String,
    pub co2: String,
    pub c2h2: String,
    pub pm10: String,
    pub pm100: String,
    pub o3: String,
    pub so2: String,
    pub no2: String,
    pub hcho: String,
    pub date_created: String,
}

impl RawTelemetry {
    // Objects only, so arrays never decode positionally.
    pub fn from_slice(payload: &[u8]) -> serde_json::Result<Self> {
        let fields: Map<String, Value> = serde_json::from_slice(payload)?;
        serde_json::from_value(Value::Object(fields))
    }
}

impl CorrectedRecord {
    pub fn build(raw: &RawTelemetry, table: &AdjustmentTable) -> Option<Self> {
        Self::build_at(raw, table, Utc::now())
    }

    /// Returns `None` when the device identifier is too short to be real.
    /// A device without a profile is corrected with zero offsets.
    pub fn build_at(
        raw: &RawTelemetry,
        table: &AdjustmentTable,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if raw.mac.len() < MIN_DEVICE_ID_LEN {
            return None;
        }

        let fallback = AdjustmentProfile::default();
        let p = table.get(&raw.mac).unwrap_or(&fallback);

        Some(Self {
            device: raw.mac.clone(),
            humidity: adjust(raw.hum, &p.hum_adjust, false),
            // Temperature is the only channel that can legitimately go below zero.
            temperature: adjust(raw.temp, &p.temp_adjust, true),
            co: adjust(raw.co, &p.co_adjust, false),
            tvoc: adjust(raw.tvoc, &p.tvoc_adjust, false),
            pm2p5: adjust(raw.pm2p5, &p.pm2p5_adjust, false),
            co2: adjust(raw.co2, &p.co2_adjust, false),
            c2h2: adjust(raw.c2h2, &p.c2h2_adjust, false),
            pm10: adjust(raw.pm10, &p.pm10_adjust, false),
            pm100: adjust(raw.pm100, &p.pm100_adjust, false),
            o3: adjust(raw.o3, &p.o3_adjust, false),
            so2: adjust(raw.so2, &p.so2_adjust, false),
            no2: adjust(raw.no2, &p.no2_adjust, false),
            hcho: adjust(raw.hcho, &p.hcho_adjust, false),
            date_created: now.format(DATE_FORMAT).to_string(),
        })
    }
}
