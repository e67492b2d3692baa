use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::PriceQuote;
use crate::error::RenderError;

/// A quote document template, parsed once and reusable across quotes.
/// Placeholders are written `{{ name }}` and substituted from
/// [`PriceQuote::fields`] plus the render stamp.
#[derive(Clone, Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let open = offset + start;
            let after = &rest[start + 2..];

            let end = after
                .find("}}")
                .ok_or(RenderError::UnterminatedPlaceholder(open))?;

            let name = after[..end].trim();

            if name.is_empty() {
                return Err(RenderError::EmptyPlaceholder(open));
            }

            segments.push(Segment::Placeholder(name.to_string()));

            rest = &after[end + 2..];
            offset = open + 2 + end + 2;
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RenderError::Source(format!("{}: {}", path.display(), e)))?;

        Self::parse(&text)
    }

    /// The bundled quote document.
    pub fn default_quote() -> Self {
        Self::parse(include_str!("../templates/quote.html")).unwrap()
    }

    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();

        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }

        names
    }

    pub fn render(&self, fields: &BTreeMap<&'static str, String>) -> Result<String, RenderError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match fields.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => return Err(RenderError::UnknownPlaceholder(name.clone())),
                },
            }
        }

        Ok(out)
    }
}

/// Presentation-only metadata stamped on a rendered document; a
/// [`PriceQuote`] itself carries no clock or randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderStamp {
    pub date: DateTime<Utc>,
    pub reference: Uuid,
}

impl RenderStamp {
    pub fn now() -> Self {
        Self {
            date: Utc::now(),
            reference: Uuid::new_v4(),
        }
    }
}

pub fn render(
    quote: &PriceQuote,
    template: &Template,
    stamp: &RenderStamp,
) -> Result<Vec<u8>, RenderError> {
    let mut fields = quote.fields();

    fields.insert("date", stamp.date.format("%d/%m/%Y").to_string());
    fields.insert("reference", stamp.reference.to_string());

    Ok(template.render(&fields)?.into_bytes())
}

pub fn document_name(quote: &PriceQuote, stamp: &RenderStamp) -> String {
    format!(
        "quote_{}_{}.html",
        sanitize(&quote.request.vehicle),
        stamp.date.format("%Y%m%d_%H%M")
    )
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c.is_ascii_alphanumeric() {
            true => c.to_ascii_lowercase(),
            false => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::entities::TripRequest;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_quote() -> PriceQuote {
        PriceQuote {
            request: TripRequest::new("economy", d("10"), d("20")),
            currency: "MAD".into(),
            per_km_rate: d("1.2"),
            base_fare: d("5.00"),
            distance_charge: d("12.00"),
            time_charge: d("6.00"),
            waiting_charge: d("0.00"),
            variable_charge: d("18.00"),
            subtotal: d("23.00"),
            night_surcharge: d("0.00"),
            day_coefficient: Decimal::ONE,
            adjusted_subtotal: d("23.00"),
            supplier_margin: d("0.00"),
            operator_price: d("23.00"),
            platform_margin: d("0.00"),
            total: d("23.00"),
        }
    }

    fn stamp() -> RenderStamp {
        RenderStamp {
            date: Utc.with_ymd_and_hms(2025, 1, 3, 9, 30, 0).unwrap(),
            reference: Uuid::nil(),
        }
    }

    #[test]
    fn substitutes_placeholders() {
        let template = Template::parse("Total: {{ total }} {{currency}}").unwrap();
        let rendered = render(&sample_quote(), &template, &stamp()).unwrap();

        assert_eq!(String::from_utf8(rendered).unwrap(), "Total: 23.00 MAD");
    }

    #[test]
    fn stamp_fields_are_available() {
        let template = Template::parse("{{ date }} / {{ reference }}").unwrap();
        let rendered = render(&sample_quote(), &template, &stamp()).unwrap();

        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "03/01/2025 / 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn empty_placeholder_is_rejected_with_offset() {
        assert!(matches!(
            Template::parse("abc{{  }}def"),
            Err(RenderError::EmptyPlaceholder(3))
        ));
    }

    #[test]
    fn unterminated_placeholder_is_rejected_with_offset() {
        assert!(matches!(
            Template::parse("abc{{ total"),
            Err(RenderError::UnterminatedPlaceholder(3))
        ));
    }

    #[test]
    fn unknown_placeholder_is_rejected_by_name() {
        let template = Template::parse("{{ discount }}").unwrap();

        match render(&sample_quote(), &template, &stamp()) {
            Err(RenderError::UnknownPlaceholder(name)) => assert_eq!(name, "discount"),
            other => panic!("expected UnknownPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn placeholders_lists_unique_names_in_order() {
        let template = Template::parse("{{ a }}{{ b }}{{ a }}").unwrap();

        assert_eq!(template.placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn bundled_template_renders_a_quote() {
        let template = Template::default_quote();
        let rendered = render(&sample_quote(), &template, &stamp()).unwrap();
        let html = String::from_utf8(rendered).unwrap();

        assert!(html.contains("23.00"));
        assert!(html.contains("economy"));
        assert!(html.contains("03/01/2025"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn document_name_embeds_vehicle_and_timestamp() {
        assert_eq!(
            document_name(&sample_quote(), &stamp()),
            "quote_economy_20250103_0930.html"
        );

        let mut quote = sample_quote();
        quote.request.vehicle = "Grand Tourer".into();

        assert_eq!(
            document_name(&quote, &stamp()),
            "quote_grand_tourer_20250103_0930.html"
        );
    }
}
