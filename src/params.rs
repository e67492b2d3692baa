use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;

use crate::entities::{Multipliers, RateCard, RateTable};
use crate::error::ParameterError;
use crate::external::sheets;

#[derive(Clone, Debug, PartialEq)]
pub enum RateSource {
    File(PathBuf),
    Http(String),
}

impl RateSource {
    pub fn parse(raw: &str) -> Self {
        match raw.starts_with("http://") || raw.starts_with("https://") {
            true => Self::Http(raw.into()),
            false => Self::File(PathBuf::from(raw)),
        }
    }

    pub fn read(&self) -> Result<String, ParameterError> {
        match self {
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| ParameterError::Source(format!("{}: {}", path.display(), e))),
            Self::Http(url) => sheets::fetch_csv(url),
        }
    }
}

/// Holds the active rate table and swaps it atomically on reload, so
/// in-flight pricing keeps the snapshot it started with.
pub struct ParameterStore {
    inner: ArcSwap<RateTable>,
}

impl ParameterStore {
    pub fn new(table: RateTable) -> Self {
        Self {
            inner: ArcSwap::from_pointee(table),
        }
    }

    pub fn load(
        rates: &RateSource,
        multipliers: Option<&RateSource>,
    ) -> Result<Self, ParameterError> {
        Ok(Self::new(load_table(rates, multipliers)?))
    }

    pub fn table(&self) -> Arc<RateTable> {
        self.inner.load_full()
    }

    #[tracing::instrument(skip(self))]
    pub fn reload(
        &self,
        rates: &RateSource,
        multipliers: Option<&RateSource>,
    ) -> Result<(), ParameterError> {
        let currency = self.table().currency().to_string();
        let table = load_table(rates, multipliers)?.with_currency(currency);

        tracing::info!("swapping in rate table with {} categories", table.len());
        self.inner.store(Arc::new(table));

        Ok(())
    }
}

#[tracing::instrument]
pub fn load_table(
    rates: &RateSource,
    multipliers: Option<&RateSource>,
) -> Result<RateTable, ParameterError> {
    let rates_csv = rates.read()?;

    let multipliers_csv = match multipliers {
        Some(source) => Some(source.read()?),
        None => None,
    };

    table_from_csv(&rates_csv, multipliers_csv.as_deref())
}

pub fn table_from_csv(
    rates_csv: &str,
    multipliers_csv: Option<&str>,
) -> Result<RateTable, ParameterError> {
    let cards = parse_rates(rates_csv)?;

    let multipliers = match multipliers_csv {
        Some(text) => parse_multipliers(text)?,
        None => Multipliers::default(),
    };

    RateTable::new(cards, multipliers)
}

#[derive(Clone, Debug, PartialEq)]
enum Column {
    Category,
    BaseFare,
    PerKm,
    PerMinute,
    SurchargePct,
    Tier(Decimal),
    Other,
}

fn classify_header(raw: &str) -> Column {
    let name = normalize_header(raw);

    match name.as_str() {
        "category" | "vehicle" => Column::Category,
        "base_fare" | "base" => Column::BaseFare,
        "per_km" | "per_km_rate" => Column::PerKm,
        "per_minute" | "per_min" | "per_minute_rate" => Column::PerMinute,
        "surcharge_pct" | "surcharge" | "surcharge_percent" => Column::SurchargePct,
        _ => match tier_cutoff(&name) {
            Some(cutoff) => Column::Tier(cutoff),
            None => Column::Other,
        },
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Distance-tier headers are a cutoff with an optional km suffix, as in
/// `30 km`, `30km` or plain `30`.
fn tier_cutoff(name: &str) -> Option<Decimal> {
    let stem = name
        .strip_suffix("_km")
        .or_else(|| name.strip_suffix("km"))
        .unwrap_or(name);

    match Decimal::from_str(stem) {
        Ok(cutoff) if cutoff >= Decimal::ZERO => Some(cutoff),
        _ => None,
    }
}

fn required_column(
    columns: &[Column],
    want: Column,
    name: &'static str,
) -> Result<usize, ParameterError> {
    columns
        .iter()
        .rposition(|column| *column == want)
        .ok_or(ParameterError::MissingColumn(name))
}

fn parse_rate(row: usize, column: &str, value: &str) -> Result<Decimal, ParameterError> {
    let rate = Decimal::from_str(value.trim()).map_err(|_| ParameterError::InvalidRate {
        row,
        column: column.into(),
        value: value.into(),
    })?;

    if rate < Decimal::ZERO {
        return Err(ParameterError::NegativeRate {
            row,
            column: column.into(),
            value: value.into(),
        });
    }

    Ok(rate)
}

fn parse_rates(csv_text: &str) -> Result<Vec<RateCard>, ParameterError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let columns: Vec<Column> = headers.iter().map(|h| classify_header(h)).collect();

    for (header, column) in headers.iter().zip(&columns) {
        if *column == Column::Other {
            tracing::warn!("ignoring unrecognized rate column `{}`", header);
        }
    }

    let category_idx = required_column(&columns, Column::Category, "category")?;
    let base_idx = required_column(&columns, Column::BaseFare, "base_fare")?;
    let per_km_idx = required_column(&columns, Column::PerKm, "per_km")?;
    let per_minute_idx = required_column(&columns, Column::PerMinute, "per_minute")?;
    let surcharge_idx = required_column(&columns, Column::SurchargePct, "surcharge_pct")?;

    let mut cards = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let category = record.get(category_idx).unwrap_or("").trim();

        if category.is_empty() {
            return Err(ParameterError::EmptyCategory { row });
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let mut card = RateCard::new(
            category,
            parse_rate(row, &headers[base_idx], cell(base_idx))?,
            parse_rate(row, &headers[per_km_idx], cell(per_km_idx))?,
            parse_rate(row, &headers[per_minute_idx], cell(per_minute_idx))?,
            parse_rate(row, &headers[surcharge_idx], cell(surcharge_idx))?,
        );

        for (idx, column) in columns.iter().enumerate() {
            if let Column::Tier(cutoff) = column {
                let value = cell(idx);

                // Sparse tier cells mean the category has no override there.
                if value.trim().is_empty() {
                    continue;
                }

                card.km_tiers
                    .insert(*cutoff, parse_rate(row, &headers[idx], value)?);
            }
        }

        cards.push(card);
    }

    Ok(cards)
}

fn parse_multipliers(csv_text: &str) -> Result<Multipliers, ParameterError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let type_idx = headers
        .iter()
        .position(|h| matches!(normalize_header(h).as_str(), "type" | "name" | "multiplier"))
        .ok_or(ParameterError::MissingColumn("type"))?;
    let value_idx = headers
        .iter()
        .position(|h| normalize_header(h) == "value")
        .ok_or(ParameterError::MissingColumn("value"))?;

    let mut multipliers = Multipliers::default();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let name = record.get(type_idx).unwrap_or("");
        let value = record.get(value_idx).unwrap_or("");

        match normalize_header(name).as_str() {
            "weekend" => multipliers.weekend = parse_rate(row, "value", value)?,
            "holiday" => multipliers.holiday = parse_rate(row, "value", value)?,
            "supplier_margin_pct" | "supplier_margin" => {
                multipliers.supplier_margin_pct = parse_rate(row, "value", value)?
            }
            "platform_margin_pct" | "platform_margin" => {
                multipliers.platform_margin_pct = parse_rate(row, "value", value)?
            }
            other => tracing::warn!("ignoring unknown multiplier `{}`", other),
        }
    }

    Ok(multipliers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: &str = "\
category,base_fare,per_km,per_minute,surcharge_pct,30 km,50 km
economy,5.00,1.20,0.30,10,,
minibus,20.00,6.50,0.55,12.5,5.50,4.50
";

    const MULTIPLIERS: &str = "\
type,value
weekend,0.93
holiday,1.10
supplier_margin_pct,10
platform_margin_pct,20
";

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_rates_with_tier_columns() {
        let cards = parse_rates(RATES).unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].category, "economy");
        assert_eq!(cards[0].base_fare, d("5.00"));
        assert_eq!(cards[0].per_km, d("1.20"));
        assert_eq!(cards[0].per_minute, d("0.30"));
        assert_eq!(cards[0].surcharge_pct, d("10"));
        assert!(cards[0].km_tiers.is_empty());

        assert_eq!(cards[1].km_tiers.len(), 2);
        assert_eq!(cards[1].km_tiers[&d("30")], d("5.50"));
        assert_eq!(cards[1].km_tiers[&d("50")], d("4.50"));
    }

    #[test]
    fn accepts_header_aliases() {
        let cards = parse_rates(
            "Vehicle,Base,Per-Km,Per Min,Surcharge\neconomy,5,1.2,0.3,10\n",
        )
        .unwrap();

        assert_eq!(cards[0].category, "economy");
        assert_eq!(cards[0].per_minute, d("0.3"));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let result = parse_rates("category,base_fare,per_km,surcharge_pct\neconomy,5,1.2,10\n");

        assert!(matches!(
            result,
            Err(ParameterError::MissingColumn("per_minute"))
        ));
    }

    #[test]
    fn bad_number_carries_row_and_column() {
        let result = parse_rates(
            "category,base_fare,per_km,per_minute,surcharge_pct\n\
             economy,5,1.2,0.3,10\n\
             minibus,20,six,0.55,12.5\n",
        );

        match result {
            Err(ParameterError::InvalidRate { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "per_km");
                assert_eq!(value, "six");
            }
            other => panic!("expected InvalidRate, got {:?}", other),
        }
    }

    #[test]
    fn negative_rate_is_rejected() {
        let result = parse_rates(
            "category,base_fare,per_km,per_minute,surcharge_pct\neconomy,-5,1.2,0.3,10\n",
        );

        assert!(matches!(result, Err(ParameterError::NegativeRate { .. })));
    }

    #[test]
    fn empty_category_cell_is_rejected() {
        let result = parse_rates(
            "category,base_fare,per_km,per_minute,surcharge_pct\n ,5,1.2,0.3,10\n",
        );

        assert!(matches!(
            result,
            Err(ParameterError::EmptyCategory { row: 2 })
        ));
    }

    #[test]
    fn all_blank_rows_are_skipped() {
        let cards = parse_rates(
            "category,base_fare,per_km,per_minute,surcharge_pct\neconomy,5,1.2,0.3,10\n,,,,\n",
        )
        .unwrap();

        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn parses_multiplier_sheet() {
        let multipliers = parse_multipliers(MULTIPLIERS).unwrap();

        assert_eq!(multipliers.weekend, d("0.93"));
        assert_eq!(multipliers.holiday, d("1.10"));
        assert_eq!(multipliers.supplier_margin_pct, d("10"));
        assert_eq!(multipliers.platform_margin_pct, d("20"));
    }

    #[test]
    fn unknown_multiplier_rows_are_skipped() {
        let multipliers = parse_multipliers("type,value\nweekend,0.93\nrush_hour,1.4\n").unwrap();

        assert_eq!(multipliers.weekend, d("0.93"));
        assert_eq!(multipliers.holiday, Decimal::ONE);
    }

    #[test]
    fn missing_multipliers_default_to_neutral() {
        let multipliers = parse_multipliers("type,value\n").unwrap();

        assert_eq!(multipliers, Multipliers::default());
    }

    #[test]
    fn bundled_fixtures_load() {
        let table = table_from_csv(
            include_str!("../fixtures/rates.csv"),
            Some(include_str!("../fixtures/multipliers.csv")),
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.card("economy").is_some());
        assert_eq!(table.multipliers().platform_margin_pct, d("20"));
    }

    #[test]
    fn sources_parse_as_urls_or_paths() {
        assert_eq!(
            RateSource::parse("https://example.com/rates.csv"),
            RateSource::Http("https://example.com/rates.csv".into())
        );
        assert_eq!(
            RateSource::parse("fixtures/rates.csv"),
            RateSource::File(PathBuf::from("fixtures/rates.csv"))
        );
    }

    #[test]
    fn load_table_rejects_duplicate_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(
            &path,
            "category,base_fare,per_km,per_minute,surcharge_pct\n\
             economy,5,1.2,0.3,10\n\
             Economy,6,1.4,0.35,10\n",
        )
        .unwrap();

        let result = load_table(&RateSource::File(path), None);

        assert!(matches!(
            result,
            Err(ParameterError::DuplicateCategory(_))
        ));
    }

    #[test]
    fn reload_swaps_table_and_keeps_currency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(&path, RATES).unwrap();

        let source = RateSource::File(path.clone());
        let store = ParameterStore::new(
            load_table(&source, None).unwrap().with_currency("EUR"),
        );

        std::fs::write(
            &path,
            "category,base_fare,per_km,per_minute,surcharge_pct\nshuttle,8,2.0,0.4,5\n",
        )
        .unwrap();
        store.reload(&source, None).unwrap();

        let table = store.table();
        assert!(table.card("shuttle").is_some());
        assert!(table.card("economy").is_none());
        assert_eq!(table.currency(), "EUR");
    }

    #[test]
    fn failed_reload_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(&path, RATES).unwrap();

        let source = RateSource::File(path.clone());
        let store = ParameterStore::load(&source, None).unwrap();

        std::fs::write(&path, "category,base_fare\nbroken,5\n").unwrap();
        assert!(store.reload(&source, None).is_err());

        assert!(store.table().card("economy").is_some());
    }
}
