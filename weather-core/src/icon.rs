use serde::{Deserialize, Serialize};

use crate::model::Condition;

const CDN_DAY_ICON: &str = "https://cdn.weatherapi.com/weather/64x64/day";

/// Where the condition icon URL comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconStrategy {
    /// Map the condition code through a small static table of daytime icons.
    LookupTable,
    /// Use the icon URL the provider sent with the condition.
    #[default]
    ProviderUrl,
}

impl IconStrategy {
    pub fn icon_url(&self, condition: Option<&Condition>) -> Option<String> {
        match self {
            IconStrategy::LookupTable => {
                let code = condition.and_then(|c| c.code);
                Some(format!("{CDN_DAY_ICON}/{}.png", icon_number(code)))
            }
            IconStrategy::ProviderUrl => {
                let icon = condition?.icon.as_deref()?.trim();
                if icon.is_empty() {
                    None
                } else if icon.starts_with("//") {
                    Some(format!("https:{icon}"))
                } else {
                    Some(icon.to_string())
                }
            }
        }
    }
}

/// Unknown codes fall back to clear sky.
fn icon_number(code: Option<i64>) -> u16 {
    match code {
        Some(1003) => 116,
        Some(1006) => 119,
        _ => 113,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(code: Option<i64>, icon: Option<&str>) -> Condition {
        Condition { text: None, icon: icon.map(str::to_string), code }
    }

    #[test]
    fn lookup_table_maps_known_codes() {
        let strategy = IconStrategy::LookupTable;
        assert_eq!(
            strategy.icon_url(Some(&condition(Some(1003), None))).as_deref(),
            Some("https://cdn.weatherapi.com/weather/64x64/day/116.png")
        );
        assert_eq!(
            strategy.icon_url(Some(&condition(Some(1006), None))).as_deref(),
            Some("https://cdn.weatherapi.com/weather/64x64/day/119.png")
        );
    }

    #[test]
    fn lookup_table_defaults_to_clear() {
        let strategy = IconStrategy::LookupTable;
        let clear = Some("https://cdn.weatherapi.com/weather/64x64/day/113.png".to_string());
        assert_eq!(strategy.icon_url(Some(&condition(Some(1195), None))), clear);
        assert_eq!(strategy.icon_url(None), clear);
    }

    #[test]
    fn provider_url_adds_scheme_to_protocol_relative_icons() {
        let c = condition(None, Some("//cdn.weatherapi.com/weather/64x64/night/296.png"));
        assert_eq!(
            IconStrategy::ProviderUrl.icon_url(Some(&c)).as_deref(),
            Some("https://cdn.weatherapi.com/weather/64x64/night/296.png")
        );
    }

    #[test]
    fn provider_url_missing_icon_is_none() {
        assert_eq!(IconStrategy::ProviderUrl.icon_url(Some(&condition(Some(1000), None))), None);
        assert_eq!(IconStrategy::ProviderUrl.icon_url(None), None);
    }
}
