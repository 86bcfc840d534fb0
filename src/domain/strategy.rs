//! Trade-plan configuration.
//!
//! Retracement levels are expressed as ratios of the swing range measured
//! back from the second swing point: 0.0 is point `b`, 1.0 is point `a`.

use std::fmt;

use super::error::SwingtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Retracement,
    Breakout,
}

impl PlanKind {
    pub fn from_name(name: &str) -> Result<Self, SwingtraderError> {
        match name.trim().to_lowercase().as_str() {
            "retracement" => Ok(PlanKind::Retracement),
            "breakout" => Ok(PlanKind::Breakout),
            other => Err(SwingtraderError::invalid_parameter(
                "plan_kind",
                format!("unknown plan kind '{other}'"),
            )),
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::Retracement => write!(f, "retracement"),
            PlanKind::Breakout => write!(f, "breakout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetracementParams {
    pub entry_ratio: f64,
    pub stop_ratio: f64,
    pub target_ratio: f64,
    /// First target, where `partial_fraction` of the position is closed.
    pub partial_target_ratio: Option<f64>,
    pub partial_fraction: f64,
    /// Stop level used after the partial exit. Takes precedence over
    /// `move_stop_to_breakeven`.
    pub post_partial_stop_ratio: Option<f64>,
    pub move_stop_to_breakeven: bool,
}

impl Default for RetracementParams {
    fn default() -> Self {
        RetracementParams {
            entry_ratio: 0.618,
            stop_ratio: 0.5,
            target_ratio: 0.236,
            partial_target_ratio: None,
            partial_fraction: 0.5,
            post_partial_stop_ratio: None,
            move_stop_to_breakeven: true,
        }
    }
}

impl RetracementParams {
    pub fn validate(&self) -> Result<(), SwingtraderError> {
        for (name, value) in [
            ("entry_ratio", self.entry_ratio),
            ("stop_ratio", self.stop_ratio),
            ("target_ratio", self.target_ratio),
        ] {
            if !value.is_finite() {
                return Err(SwingtraderError::invalid_parameter(name, "must be finite"));
            }
        }
        if let Some(ratio) = self.partial_target_ratio {
            if !ratio.is_finite() {
                return Err(SwingtraderError::invalid_parameter(
                    "partial_target_ratio",
                    "must be finite",
                ));
            }
            if !(self.partial_fraction > 0.0 && self.partial_fraction < 1.0) {
                return Err(SwingtraderError::invalid_parameter(
                    "partial_fraction",
                    "must be between 0 and 1 (exclusive)",
                ));
            }
        }
        if let Some(ratio) = self.post_partial_stop_ratio {
            if !ratio.is_finite() {
                return Err(SwingtraderError::invalid_parameter(
                    "post_partial_stop_ratio",
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub r_multiple: f64,
    /// Fee per side; each exit leg is charged twice this rate.
    pub fee_rate: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        BreakoutParams {
            r_multiple: 2.0,
            fee_rate: 0.001,
        }
    }
}

impl BreakoutParams {
    pub fn validate(&self) -> Result<(), SwingtraderError> {
        if !(self.r_multiple.is_finite() && self.r_multiple > 0.0) {
            return Err(SwingtraderError::invalid_parameter(
                "r_multiple",
                "must be positive",
            ));
        }
        if !(self.fee_rate.is_finite() && self.fee_rate >= 0.0) {
            return Err(SwingtraderError::invalid_parameter(
                "fee_rate",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanConfig {
    Retracement(RetracementParams),
    Breakout(BreakoutParams),
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig::Retracement(RetracementParams::default())
    }
}

impl PlanConfig {
    pub fn kind(&self) -> PlanKind {
        match self {
            PlanConfig::Retracement(_) => PlanKind::Retracement,
            PlanConfig::Breakout(_) => PlanKind::Breakout,
        }
    }

    pub fn validate(&self) -> Result<(), SwingtraderError> {
        match self {
            PlanConfig::Retracement(params) => params.validate(),
            PlanConfig::Breakout(params) => params.validate(),
        }
    }
}
