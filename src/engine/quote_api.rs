use super::Engine;

use rust_decimal::Decimal;

use crate::api::QuoteAPI;
use crate::entities::{money, PriceQuote, RateTable, TripRequest};
use crate::error::PricingError;

/// Price a trip against a rate table snapshot.
///
/// Each money line is rounded to two decimals as it is produced, and later
/// lines are computed from the rounded values, so the breakdown sums exactly
/// to the printed totals. Identical inputs always yield identical quotes.
#[tracing::instrument(skip(table))]
pub fn compute_quote(
    request: &TripRequest,
    table: &RateTable,
) -> Result<PriceQuote, PricingError> {
    request.validate()?;

    let card = table
        .card(&request.vehicle)
        .ok_or_else(|| PricingError::UnknownVehicle(request.vehicle.clone()))?;
    let multipliers = table.multipliers();

    let per_km_rate = card.per_km_at(request.distance_km);

    let base_fare = money(card.base_fare * request.urgency.coefficient());
    let distance_charge = money(request.distance_km * per_km_rate);
    let time_charge = money(request.duration_min * card.per_minute);
    let waiting_charge = money(request.waiting_min * card.per_minute);
    let variable_charge = money(distance_charge + time_charge + waiting_charge);
    let subtotal = money(base_fare + variable_charge);

    let night_surcharge = match request.night {
        true => money(subtotal * card.surcharge_pct / Decimal::ONE_HUNDRED),
        false => money(Decimal::ZERO),
    };

    let mut day_coefficient = Decimal::ONE;

    if request.weekend {
        day_coefficient *= multipliers.weekend;
    }

    if request.holiday {
        day_coefficient *= multipliers.holiday;
    }

    let adjusted_subtotal = money((subtotal + night_surcharge) * day_coefficient);

    let supplier_margin =
        money(adjusted_subtotal * multipliers.supplier_margin_pct / Decimal::ONE_HUNDRED);
    let operator_price = money(adjusted_subtotal + supplier_margin);
    let platform_margin =
        money(operator_price * multipliers.platform_margin_pct / Decimal::ONE_HUNDRED);
    let total = money(operator_price + platform_margin);

    Ok(PriceQuote {
        request: request.clone(),
        currency: table.currency().into(),
        per_km_rate,
        base_fare,
        distance_charge,
        time_charge,
        waiting_charge,
        variable_charge,
        subtotal,
        night_surcharge,
        day_coefficient,
        adjusted_subtotal,
        supplier_margin,
        operator_price,
        platform_margin,
        total,
    })
}

impl QuoteAPI for Engine {
    #[tracing::instrument(skip(self))]
    fn create_quote(&self, request: &TripRequest) -> Result<PriceQuote, PricingError> {
        let table = self.params.table();

        compute_quote(request, &table)
    }
}
