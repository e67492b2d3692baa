use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

pub const DEFAULT_CURRENCY: &str = "MAD";

/// Rates for one pricing category (a vehicle class or service zone).
///
/// `per_km` is the per-kilometre rate from 0 km; `km_tiers` maps distance
/// cutoffs to per-kilometre overrides that apply from that cutoff onwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub category: String,
    pub base_fare: Decimal,
    pub per_km: Decimal,
    pub per_minute: Decimal,
    pub surcharge_pct: Decimal,
    #[serde(default)]
    pub km_tiers: BTreeMap<Decimal, Decimal>,
}

impl RateCard {
    pub fn new(
        category: impl Into<String>,
        base_fare: Decimal,
        per_km: Decimal,
        per_minute: Decimal,
        surcharge_pct: Decimal,
    ) -> Self {
        Self {
            category: category.into(),
            base_fare,
            per_km,
            per_minute,
            surcharge_pct,
            km_tiers: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, from_km: Decimal, per_km: Decimal) -> Self {
        self.km_tiers.insert(from_km, per_km);
        self
    }

    /// Per-kilometre rate applying at `distance_km`: the rate of the largest
    /// tier cutoff not exceeding the distance, or `per_km` below every cutoff.
    pub fn per_km_at(&self, distance_km: Decimal) -> Decimal {
        let mut rate = self.per_km;

        for (cutoff, tier_rate) in &self.km_tiers {
            if distance_km >= *cutoff {
                rate = *tier_rate;
            } else {
                break;
            }
        }

        rate
    }
}

/// Global coefficients from the optional multipliers sheet. Absent rows keep
/// their neutral defaults, so a rates-only load prices without adjustments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub weekend: Decimal,
    pub holiday: Decimal,
    pub supplier_margin_pct: Decimal,
    pub platform_margin_pct: Decimal,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            weekend: Decimal::ONE,
            holiday: Decimal::ONE,
            supplier_margin_pct: Decimal::ZERO,
            platform_margin_pct: Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    categories: HashMap<String, RateCard>,
    multipliers: Multipliers,
    currency: String,
}

impl RateTable {
    pub fn new(cards: Vec<RateCard>, multipliers: Multipliers) -> Result<Self, ParameterError> {
        if cards.is_empty() {
            return Err(ParameterError::Empty);
        }

        let mut categories = HashMap::with_capacity(cards.len());

        for card in cards {
            let key = normalize_category(&card.category);

            if categories.insert(key, card.clone()).is_some() {
                return Err(ParameterError::DuplicateCategory(card.category));
            }
        }

        Ok(Self {
            categories,
            multipliers,
            currency: DEFAULT_CURRENCY.into(),
        })
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn card(&self, category: &str) -> Option<&RateCard> {
        self.categories.get(&normalize_category(category))
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .categories
            .values()
            .map(|card| card.category.as_str())
            .collect();

        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn multipliers(&self) -> &Multipliers {
        &self.multipliers
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[test]
fn per_km_rate_uses_largest_reached_tier() {
    use std::str::FromStr;

    let card = RateCard::new(
        "minibus",
        Decimal::from_str("20").unwrap(),
        Decimal::from_str("6.5").unwrap(),
        Decimal::from_str("0.55").unwrap(),
        Decimal::from_str("12.5").unwrap(),
    )
    .with_tier(Decimal::from_str("30").unwrap(), Decimal::from_str("5.5").unwrap())
    .with_tier(Decimal::from_str("50").unwrap(), Decimal::from_str("4.5").unwrap());

    assert_eq!(card.per_km_at(Decimal::ZERO), Decimal::from_str("6.5").unwrap());
    assert_eq!(
        card.per_km_at(Decimal::from_str("29.9").unwrap()),
        Decimal::from_str("6.5").unwrap()
    );
    assert_eq!(
        card.per_km_at(Decimal::from_str("30").unwrap()),
        Decimal::from_str("5.5").unwrap()
    );
    assert_eq!(
        card.per_km_at(Decimal::from_str("34").unwrap()),
        Decimal::from_str("5.5").unwrap()
    );
    assert_eq!(
        card.per_km_at(Decimal::from_str("120").unwrap()),
        Decimal::from_str("4.5").unwrap()
    );
}

#[test]
fn flat_card_ignores_distance() {
    use std::str::FromStr;

    let card = RateCard::new(
        "economy",
        Decimal::from_str("5").unwrap(),
        Decimal::from_str("1.2").unwrap(),
        Decimal::from_str("0.3").unwrap(),
        Decimal::from_str("10").unwrap(),
    );

    assert_eq!(
        card.per_km_at(Decimal::from_str("500").unwrap()),
        Decimal::from_str("1.2").unwrap()
    );
}

#[test]
fn category_lookup_is_case_insensitive() {
    use std::str::FromStr;

    let table = RateTable::new(
        vec![RateCard::new(
            "Economy",
            Decimal::from_str("5").unwrap(),
            Decimal::from_str("1.2").unwrap(),
            Decimal::from_str("0.3").unwrap(),
            Decimal::from_str("10").unwrap(),
        )],
        Multipliers::default(),
    )
    .unwrap();

    assert!(table.card("economy").is_some());
    assert!(table.card(" ECONOMY ").is_some());
    assert!(table.card("luxury").is_none());
}

#[test]
fn duplicate_categories_are_rejected() {
    use std::str::FromStr;

    let card = RateCard::new(
        "economy",
        Decimal::from_str("5").unwrap(),
        Decimal::from_str("1.2").unwrap(),
        Decimal::from_str("0.3").unwrap(),
        Decimal::from_str("10").unwrap(),
    );

    let result = RateTable::new(
        vec![card.clone(), RateCard { category: "ECONOMY".into(), ..card }],
        Multipliers::default(),
    );

    assert!(matches!(result, Err(ParameterError::DuplicateCategory(_))));
}

#[test]
fn empty_table_is_rejected() {
    assert!(matches!(
        RateTable::new(vec![], Multipliers::default()),
        Err(ParameterError::Empty)
    ));
}
