//! Configuration validation.
//!
//! Checks every section a backtest reads before any data is loaded. Keys
//! that are absent fall back to their defaults and are not errors.

use crate::domain::error::SwingtraderError;
use crate::ports::config_port::ConfigPort;

const SWING_METHODS: [&str; 3] = ["local_extrema", "zigzag", "fractal"];
const PLAN_KINDS: [&str; 2] = ["retracement", "breakout"];
const MA_TYPES: [&str; 2] = ["SMA", "EMA"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    validate_swing(config)?;
    validate_trend(config)?;
    validate_plan(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SwingtraderError {
    SwingtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// A present but unparsable number is an error; an absent or empty one is
/// `None`.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SwingtraderError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => match config.get_opt_double(section, key) {
            Some(value) => Ok(Some(value)),
            None => Err(invalid(section, key, format!("'{raw}' is not a number"))),
        },
        _ => Ok(None),
    }
}

fn finite(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SwingtraderError> {
    match read_double(config, section, key)? {
        Some(value) if !value.is_finite() => Err(invalid(section, key, "must be finite")),
        other => Ok(other),
    }
}

fn validate_swing(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let method = config
        .get_string("swing", "method")
        .unwrap_or_else(|| "local_extrema".to_string())
        .trim()
        .to_lowercase();
    if !SWING_METHODS.contains(&method.as_str()) {
        return Err(invalid(
            "swing",
            "method",
            format!("unknown method '{method}' (expected one of {SWING_METHODS:?})"),
        ));
    }

    let Some(param) = finite(config, "swing", "param")? else {
        return Ok(());
    };
    if method == "zigzag" {
        if param <= 0.0 || param >= 1.0 {
            return Err(invalid(
                "swing",
                "param",
                "zigzag deviation must be between 0 and 1",
            ));
        }
    } else if param < 1.0 || param.fract() != 0.0 {
        return Err(invalid(
            "swing",
            "param",
            "window must be a positive whole number of bars",
        ));
    }
    Ok(())
}

fn validate_trend(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    if let Some(ma_type) = config.get_string("trend", "ma_type") {
        if !MA_TYPES.contains(&ma_type.trim().to_uppercase().as_str()) {
            return Err(invalid(
                "trend",
                "ma_type",
                format!("unknown moving average '{ma_type}'"),
            ));
        }
    }
    let period = config.get_int("trend", "period", 50);
    if period <= 0 {
        return Err(invalid("trend", "period", "period must be positive"));
    }
    Ok(())
}

fn validate_plan(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let kind = config
        .get_string("plan", "kind")
        .unwrap_or_else(|| "retracement".to_string())
        .trim()
        .to_lowercase();
    match kind.as_str() {
        "retracement" => validate_retracement(config),
        "breakout" => validate_breakout(config),
        _ => Err(invalid(
            "plan",
            "kind",
            format!("unknown plan kind '{kind}' (expected one of {PLAN_KINDS:?})"),
        )),
    }
}

fn validate_retracement(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    for key in [
        "entry_ratio",
        "stop_ratio",
        "target_ratio",
        "post_partial_stop_ratio",
    ] {
        finite(config, "retracement", key)?;
    }

    if finite(config, "retracement", "partial_target_ratio")?.is_some() {
        let fraction = finite(config, "retracement", "partial_fraction")?.unwrap_or(0.5);
        if fraction <= 0.0 || fraction >= 1.0 {
            return Err(invalid(
                "retracement",
                "partial_fraction",
                "partial_fraction must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_breakout(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    if let Some(r) = finite(config, "breakout", "r_multiple")? {
        if r <= 0.0 {
            return Err(invalid(
                "breakout",
                "r_multiple",
                "r_multiple must be positive",
            ));
        }
    }
    if let Some(fee) = finite(config, "breakout", "fee_rate")? {
        if fee < 0.0 {
            return Err(invalid(
                "breakout",
                "fee_rate",
                "fee_rate must be non-negative",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_opt_double(section, key).unwrap_or(default)
        }

        fn get_opt_double(&self, section: &str, key: &str) -> Option<f64> {
            self.get_string(section, key)
                .and_then(|v| v.trim().parse().ok())
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .map(|v| v.trim() == "true")
                .unwrap_or(default)
        }
    }

    fn assert_invalid(config: MapConfig, expected_key: &str) {
        match validate_config(&config) {
            Err(SwingtraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        assert!(validate_config(&MapConfig::new(&[])).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let config = MapConfig::new(&[
            ("swing", "method", "zigzag"),
            ("swing", "param", "0.01"),
            ("trend", "ma_type", "sma"),
            ("trend", "period", "20"),
            ("plan", "kind", "retracement"),
            ("retracement", "partial_target_ratio", "0.382"),
            ("retracement", "partial_fraction", "0.5"),
        ]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_method() {
        assert_invalid(MapConfig::new(&[("swing", "method", "pivot")]), "method");
    }

    #[test]
    fn window_param_must_be_whole() {
        assert_invalid(
            MapConfig::new(&[("swing", "method", "fractal"), ("swing", "param", "2.5")]),
            "param",
        );
        assert_invalid(
            MapConfig::new(&[("swing", "method", "local_extrema"), ("swing", "param", "0")]),
            "param",
        );
    }

    #[test]
    fn zigzag_deviation_range() {
        assert_invalid(
            MapConfig::new(&[("swing", "method", "zigzag"), ("swing", "param", "5")]),
            "param",
        );
    }

    #[test]
    fn trend_settings() {
        assert_invalid(MapConfig::new(&[("trend", "ma_type", "wma")]), "ma_type");
        assert_invalid(MapConfig::new(&[("trend", "period", "0")]), "period");
    }

    #[test]
    fn unparsable_ratio() {
        assert_invalid(
            MapConfig::new(&[("retracement", "entry_ratio", "abc")]),
            "entry_ratio",
        );
    }

    #[test]
    fn partial_fraction_only_checked_with_partial_target() {
        let config = MapConfig::new(&[("retracement", "partial_fraction", "2.0")]);
        assert!(validate_config(&config).is_ok());
        assert_invalid(
            MapConfig::new(&[
                ("retracement", "partial_target_ratio", "0.382"),
                ("retracement", "partial_fraction", "1.0"),
            ]),
            "partial_fraction",
        );
    }

    #[test]
    fn breakout_settings() {
        assert_invalid(
            MapConfig::new(&[("plan", "kind", "breakout"), ("breakout", "r_multiple", "0")]),
            "r_multiple",
        );
        assert_invalid(
            MapConfig::new(&[("plan", "kind", "breakout"), ("breakout", "fee_rate", "-0.1")]),
            "fee_rate",
        );
        // breakout keys are not read for retracement plans
        let config = MapConfig::new(&[("breakout", "r_multiple", "0")]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_plan_kind() {
        assert_invalid(MapConfig::new(&[("plan", "kind", "scalp")]), "kind");
    }

    #[test]
    fn empty_value_is_unset() {
        let config = MapConfig::new(&[("retracement", "post_partial_stop_ratio", "")]);
        assert_eq!(
            read_double(&config, "retracement", "post_partial_stop_ratio").unwrap(),
            None
        );
    }
}
