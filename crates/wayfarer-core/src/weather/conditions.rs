use crate::models::WeatherCondition;

/// Provider condition codes (2xx thunderstorm ... 80x clouds)
pub fn condition_from_code(code: u16) -> Option<WeatherCondition> {
    match code {
        200..=299 => Some(WeatherCondition::Storm),
        300..=399 | 500..=599 => Some(WeatherCondition::Rain),
        600..=699 => Some(WeatherCondition::Snow),
        // mist, haze, fog and friends
        700..=799 => Some(WeatherCondition::Cloudy),
        800 => Some(WeatherCondition::Sunny),
        801 | 802 => Some(WeatherCondition::PartlyCloudy),
        803 | 804 => Some(WeatherCondition::Cloudy),
        _ => None,
    }
}

/// Icon codes look like `10d`; only the two-digit prefix matters
pub fn condition_from_icon(icon: &str) -> Option<WeatherCondition> {
    match icon.trim().get(..2)? {
        "01" => Some(WeatherCondition::Sunny),
        "02" => Some(WeatherCondition::PartlyCloudy),
        "03" | "04" | "50" => Some(WeatherCondition::Cloudy),
        "09" | "10" => Some(WeatherCondition::Rain),
        "11" => Some(WeatherCondition::Storm),
        "13" => Some(WeatherCondition::Snow),
        _ => None,
    }
}

/// Numeric code wins; the icon prefix is the fallback; `Cloudy` if neither is known
pub fn map_condition(code: Option<u16>, icon: &str) -> WeatherCondition {
    code.and_then(condition_from_code)
        .or_else(|| condition_from_icon(icon))
        .unwrap_or(WeatherCondition::Cloudy)
}
