use std::sync::Arc;

use crate::entities::{PriceQuote, RateTable, TripRequest};
use crate::error::{ParameterError, PricingError, RenderError};
use crate::params::RateSource;
use crate::render::{RenderStamp, Template};

pub trait ParameterAPI {
    fn reload_rates(
        &self,
        rates: &RateSource,
        multipliers: Option<&RateSource>,
    ) -> Result<(), ParameterError>;

    fn rate_table(&self) -> Arc<RateTable>;
}

pub trait QuoteAPI {
    fn create_quote(&self, request: &TripRequest) -> Result<PriceQuote, PricingError>;
}

pub trait RenderAPI {
    fn render_quote(&self, quote: &PriceQuote, template: &Template)
        -> Result<Vec<u8>, RenderError>;

    fn render_quote_with_stamp(
        &self,
        quote: &PriceQuote,
        template: &Template,
        stamp: &RenderStamp,
    ) -> Result<Vec<u8>, RenderError>;
}

pub trait API: ParameterAPI + QuoteAPI + RenderAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
