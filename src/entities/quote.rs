use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::TripRequest;

/// Fully priced trip. Every money field is rounded to two decimal places;
/// `per_km_rate` and `day_coefficient` keep their exact values so the
/// breakdown can be audited against the rate table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub request: TripRequest,
    pub currency: String,
    pub per_km_rate: Decimal,
    pub base_fare: Decimal,
    pub distance_charge: Decimal,
    pub time_charge: Decimal,
    pub waiting_charge: Decimal,
    pub variable_charge: Decimal,
    pub subtotal: Decimal,
    pub night_surcharge: Decimal,
    pub day_coefficient: Decimal,
    pub adjusted_subtotal: Decimal,
    pub supplier_margin: Decimal,
    pub operator_price: Decimal,
    pub platform_margin: Decimal,
    pub total: Decimal,
}

impl PriceQuote {
    /// Flat view of the quote for template substitution. Keys match the
    /// placeholder names accepted by quote templates.
    pub fn fields(&self) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();

        fields.insert("vehicle", self.request.vehicle.clone());
        fields.insert("distance_km", self.request.distance_km.to_string());
        fields.insert("duration_min", self.request.duration_min.to_string());
        fields.insert("waiting_min", self.request.waiting_min.to_string());
        fields.insert("night", yes_no(self.request.night));
        fields.insert("weekend", yes_no(self.request.weekend));
        fields.insert("holiday", yes_no(self.request.holiday));
        fields.insert("urgency", self.request.urgency.name());
        fields.insert(
            "urgency_coefficient",
            self.request.urgency.coefficient().to_string(),
        );
        fields.insert("currency", self.currency.clone());
        fields.insert("per_km_rate", self.per_km_rate.to_string());
        fields.insert("base_fare", self.base_fare.to_string());
        fields.insert("distance_charge", self.distance_charge.to_string());
        fields.insert("time_charge", self.time_charge.to_string());
        fields.insert("waiting_charge", self.waiting_charge.to_string());
        fields.insert("variable_charge", self.variable_charge.to_string());
        fields.insert("subtotal", self.subtotal.to_string());
        fields.insert("night_surcharge", self.night_surcharge.to_string());
        fields.insert("day_coefficient", self.day_coefficient.to_string());
        fields.insert("adjusted_subtotal", self.adjusted_subtotal.to_string());
        fields.insert("supplier_margin", self.supplier_margin.to_string());
        fields.insert("operator_price", self.operator_price.to_string());
        fields.insert("platform_margin", self.platform_margin.to_string());
        fields.insert("total", self.total.to_string());

        fields
    }
}

fn yes_no(flag: bool) -> String {
    match flag {
        true => "yes".into(),
        false => "no".into(),
    }
}

/// Round a money amount to two decimal places, halves away from zero.
/// The rescale keeps the scale fixed at 2 so `3.5` renders as `3.50`.
pub(crate) fn money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[test]
fn money_rounds_half_away_from_zero() {
    use std::str::FromStr;

    let d = |s: &str| Decimal::from_str(s).unwrap();

    assert_eq!(money(d("2.345")).to_string(), "2.35");
    assert_eq!(money(d("2.344")).to_string(), "2.34");
    assert_eq!(money(d("-2.345")).to_string(), "-2.35");
    assert_eq!(money(d("3.5")).to_string(), "3.50");
    assert_eq!(money(d("23")).to_string(), "23.00");
}

#[test]
fn fields_render_at_money_scale() {
    use std::str::FromStr;

    let d = |s: &str| Decimal::from_str(s).unwrap();

    let quote = PriceQuote {
        request: TripRequest::new("economy", d("10"), d("20")),
        currency: "MAD".into(),
        per_km_rate: d("1.2"),
        base_fare: money(d("5")),
        distance_charge: money(d("12")),
        time_charge: money(d("6")),
        waiting_charge: money(d("0")),
        variable_charge: money(d("18")),
        subtotal: money(d("23")),
        night_surcharge: money(d("0")),
        day_coefficient: Decimal::ONE,
        adjusted_subtotal: money(d("23")),
        supplier_margin: money(d("0")),
        operator_price: money(d("23")),
        platform_margin: money(d("0")),
        total: money(d("23")),
    };

    let fields = quote.fields();

    assert_eq!(fields["total"], "23.00");
    assert_eq!(fields["base_fare"], "5.00");
    assert_eq!(fields["per_km_rate"], "1.2");
    assert_eq!(fields["night"], "no");
    assert_eq!(fields["urgency"], "normal");

    // formatting loses nothing: parsing the rendered amount restores the value
    assert_eq!(Decimal::from_str(&fields["total"]).unwrap(), quote.total);
}
