use super::Engine;

use crate::api::RenderAPI;
use crate::entities::PriceQuote;
use crate::error::RenderError;
use crate::render::{self, RenderStamp, Template};

impl RenderAPI for Engine {
    #[tracing::instrument(skip_all)]
    fn render_quote(
        &self,
        quote: &PriceQuote,
        template: &Template,
    ) -> Result<Vec<u8>, RenderError> {
        render::render(quote, template, &RenderStamp::now())
    }

    #[tracing::instrument(skip_all)]
    fn render_quote_with_stamp(
        &self,
        quote: &PriceQuote,
        template: &Template,
        stamp: &RenderStamp,
    ) -> Result<Vec<u8>, RenderError> {
        render::render(quote, template, stamp)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::api::QuoteAPI;
    use crate::engine::compute_quote;
    use crate::entities::{Multipliers, RateCard, RateTable, TripRequest};
    use crate::params::ParameterStore;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> RateTable {
        RateTable::new(
            vec![RateCard::new("economy", d("5"), d("1.2"), d("0.3"), d("10"))],
            Multipliers::default(),
        )
        .unwrap()
    }

    #[test]
    fn engine_renders_the_bundled_template() {
        let engine = Engine::new(ParameterStore::new(table()));
        let quote = engine
            .create_quote(&TripRequest::new("economy", d("10"), d("20")))
            .unwrap();

        let rendered = engine
            .render_quote(&quote, &Template::default_quote())
            .unwrap();
        let html = String::from_utf8(rendered).unwrap();

        assert!(html.contains("23.00"));
        assert!(html.contains("MAD"));
    }

    #[test]
    fn fixed_stamp_renders_reproducibly() {
        let engine = Engine::new(ParameterStore::new(table()));
        let quote = compute_quote(&TripRequest::new("economy", d("10"), d("20")), &table()).unwrap();

        let stamp = RenderStamp::now();
        let template = Template::default_quote();

        let first = engine
            .render_quote_with_stamp(&quote, &template, &stamp)
            .unwrap();
        let second = engine
            .render_quote_with_stamp(&quote, &template, &stamp)
            .unwrap();

        assert_eq!(first, second);
    }
}
