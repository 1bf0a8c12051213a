use serde::{Deserialize, Serialize};
use std::fmt;

/// A single battery action for one 15-minute schedule slot.
///
/// The source this system is modeled on represents this as a bare string;
/// per the design note on tagged action variants, this is a small closed
/// enum here so every match site (optimizer, driver mapping, savings
/// summary) is checked exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Idle,
    ChargeGrid,
    ChargeSolar,
    Discharge,
    Sell,
}

impl Action {
    /// Maps a schedule action to the inverter driver's coarser intent:
    /// it only ever needs to know "charge", "discharge", or "idle" (§4.9).
    pub fn intent(self) -> Intent {
        match self {
            Action::ChargeGrid | Action::ChargeSolar => Intent::Charge,
            Action::Discharge | Action::Sell => Intent::Discharge,
            Action::Idle => Intent::Idle,
        }
    }

    /// True for actions that draw from the battery (used by the forward
    /// SOC pass, which treats discharge and sell identically per §9).
    pub fn is_drawing(self) -> bool {
        matches!(self, Action::Discharge | Action::Sell)
    }

    pub fn is_charging(self) -> bool {
        matches!(self, Action::ChargeGrid | Action::ChargeSolar)
    }
}

/// Coarse action intent as understood by an inverter driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Charge,
    Discharge,
    Idle,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Charge => "charge",
            Intent::Discharge => "discharge",
            Intent::Idle => "idle",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_mapping_is_exhaustive_and_correct() {
        assert_eq!(Action::ChargeGrid.intent(), Intent::Charge);
        assert_eq!(Action::ChargeSolar.intent(), Intent::Charge);
        assert_eq!(Action::Discharge.intent(), Intent::Discharge);
        assert_eq!(Action::Sell.intent(), Intent::Discharge);
        assert_eq!(Action::Idle.intent(), Intent::Idle);
    }

    #[test]
    fn serde_round_trip_uses_snake_case() {
        let json = serde_json::to_string(&Action::ChargeGrid).unwrap();
        assert_eq!(json, "\"charge_grid\"");
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Action::ChargeGrid);
    }
}
