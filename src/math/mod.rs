// src/math/mod.rs

pub mod cdp;
pub mod full_math;

pub use cdp::{calculate_cdp, PriceFeed};
pub use full_math::{
    div_up, mul_div, mul_div_up, shift_right_up, sqrt, sqrt_up, MulDiv, U256, U512, U768,
};

/// Les montants 256 bits circulent en JSON sous forme de chaînes décimales.
pub mod serde_u256 {
    use super::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(raw.trim()).map_err(|e| D::Error::custom(format!("invalid amount '{raw}': {e:?}")))
    }
}
