use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub vehicle: String,
    pub distance_km: Decimal,
    pub duration_min: Decimal,
    #[serde(default)]
    pub waiting_min: Decimal,
    #[serde(default)]
    pub night: bool,
    #[serde(default)]
    pub weekend: bool,
    #[serde(default)]
    pub holiday: bool,
    #[serde(default)]
    pub urgency: Urgency,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    Critical,
}

impl Urgency {
    pub fn coefficient(&self) -> Decimal {
        match self {
            Self::Normal => Decimal::ONE,
            Self::Urgent => Decimal::new(15, 1),
            Self::Critical => Decimal::TWO,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Normal => "normal".into(),
            Self::Urgent => "urgent".into(),
            Self::Critical => "critical".into(),
        }
    }
}

impl TripRequest {
    pub fn new(vehicle: impl Into<String>, distance_km: Decimal, duration_min: Decimal) -> Self {
        Self {
            vehicle: vehicle.into(),
            distance_km,
            duration_min,
            waiting_min: Decimal::ZERO,
            night: false,
            weekend: false,
            holiday: false,
            urgency: Urgency::Normal,
        }
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        if self.vehicle.trim().is_empty() {
            return Err(PricingError::InvalidRequest("vehicle is empty".into()));
        }

        if self.distance_km < Decimal::ZERO {
            return Err(PricingError::InvalidRequest(format!(
                "distance_km is negative: {}",
                self.distance_km
            )));
        }

        if self.duration_min < Decimal::ZERO {
            return Err(PricingError::InvalidRequest(format!(
                "duration_min is negative: {}",
                self.duration_min
            )));
        }

        if self.waiting_min < Decimal::ZERO {
            return Err(PricingError::InvalidRequest(format!(
                "waiting_min is negative: {}",
                self.waiting_min
            )));
        }

        Ok(())
    }
}

#[test]
fn defaults_are_neutral() {
    let request = TripRequest::new("economy", Decimal::TEN, Decimal::from(20));

    assert_eq!(request.waiting_min, Decimal::ZERO);
    assert!(!request.night);
    assert!(!request.weekend);
    assert!(!request.holiday);
    assert_eq!(request.urgency, Urgency::Normal);
    assert!(request.validate().is_ok());
}

#[test]
fn negative_values_fail_validation() {
    let mut request = TripRequest::new("economy", Decimal::TEN, Decimal::from(20));
    request.distance_km = Decimal::NEGATIVE_ONE;

    assert!(matches!(
        request.validate(),
        Err(PricingError::InvalidRequest(_))
    ));

    let mut request = TripRequest::new("economy", Decimal::TEN, Decimal::from(20));
    request.waiting_min = Decimal::NEGATIVE_ONE;

    assert!(matches!(
        request.validate(),
        Err(PricingError::InvalidRequest(_))
    ));
}

#[test]
fn blank_vehicle_fails_validation() {
    let request = TripRequest::new("   ", Decimal::TEN, Decimal::from(20));

    assert!(matches!(
        request.validate(),
        Err(PricingError::InvalidRequest(_))
    ));
}

#[test]
fn urgency_deserializes_snake_case() {
    let request: TripRequest = serde_json::from_str(
        r#"{"vehicle": "economy", "distance_km": "10", "duration_min": "20", "urgency": "urgent"}"#,
    )
    .unwrap();

    assert_eq!(request.urgency, Urgency::Urgent);
    assert_eq!(request.urgency.coefficient(), Decimal::new(15, 1));
}
