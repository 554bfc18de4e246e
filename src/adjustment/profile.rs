use serde::{Deserialize, Deserializer};

// Offsets stay as text; a malformed one only disables that channel's correction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdjustmentProfile {
    pub id: Option<i64>,

    #[serde(deserialize_with = "nullable_string")]
    pub device: String,

    #[serde(deserialize_with = "nullable_string")]
    pub hum_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub temp_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub co_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub co2_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub tvoc_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub pm2p5_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub pm10_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub pm100_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub c2h2_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub o3_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub so2_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub no2_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub hcho_adjust: String,

    // Not reported by current sensors.
    #[serde(deserialize_with = "nullable_string")]
    pub h2s_adjust: String,
    #[serde(deserialize_with = "nullable_string")]
    pub aqi_adjust: String,

    #[serde(deserialize_with = "nullable_string")]
    pub date_created: String,
    #[serde(deserialize_with = "nullable_string")]
    pub date_updated: String,
}

/// Treats `null` like a missing field.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
