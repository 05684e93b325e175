//! Employer contribution rates for PILA.
//!
//! Health and pension rates are fixed.  ARL depends on the risk class
//! of the activity; class V is the historical default for existing
//! call sites.

use crate::error::EngineError;
use crate::models::ArlRiskClass;
use std::str::FromStr;

/// Employer health contribution (EPS).
pub const HEALTH_RATE: f64 = 0.085;
/// Employer pension contribution (AFP).
pub const PENSION_RATE: f64 = 0.12;
/// Hours per month used to turn an hourly rate into a monthly salary.
pub const MONTHLY_HOURS: f64 = 192.0;

impl ArlRiskClass {
    /// Contribution rate as a fraction of salary.
    pub fn rate(&self) -> f64 {
        match self {
            Self::I => 0.00522,
            Self::II => 0.01044,
            Self::III => 0.02436,
            Self::IV => 0.0435,
            Self::V => 0.0696,
        }
    }
}

impl FromStr for ArlRiskClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Self::I),
            "II" | "2" => Ok(Self::II),
            "III" | "3" => Ok(Self::III),
            "IV" | "4" => Ok(Self::IV),
            "V" | "5" => Ok(Self::V),
            other => Err(EngineError::invalid(format!("unknown ARL risk class {other:?}"))),
        }
    }
}

/// Round to the nearest whole peso, halves away from zero.
pub fn round_cop(amount: f64) -> f64 {
    amount.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_v_is_default_and_matches_historical_rate() {
        assert_eq!(ArlRiskClass::default(), ArlRiskClass::V);
        assert_eq!(ArlRiskClass::default().rate(), 0.0696);
    }

    #[test]
    fn rates_increase_with_risk() {
        let classes = [
            ArlRiskClass::I,
            ArlRiskClass::II,
            ArlRiskClass::III,
            ArlRiskClass::IV,
            ArlRiskClass::V,
        ];
        let rates: Vec<f64> = classes.iter().map(|c| c.rate()).collect();
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn parses_roman_and_numeric() {
        assert_eq!("iii".parse::<ArlRiskClass>().unwrap(), ArlRiskClass::III);
        assert_eq!("4".parse::<ArlRiskClass>().unwrap(), ArlRiskClass::IV);
        assert!("VI".parse::<ArlRiskClass>().is_err());
    }
}
