use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vectura::api::{QuoteAPI, RenderAPI};
use vectura::engine::Engine;
use vectura::entities::TripRequest;
use vectura::params::{load_table, ParameterStore, RateSource};
use vectura::render::{document_name, RenderStamp, Template};

#[derive(Debug, Parser)]
#[command(about = "Price a trip against a published rate sheet")]
struct Args {
    /// Rate sheet: a csv file path or an http(s) url
    #[arg(long, env = "VECTURA_RATES")]
    rates: String,

    /// Multiplier sheet: a csv file path or an http(s) url
    #[arg(long, env = "VECTURA_MULTIPLIERS")]
    multipliers: Option<String>,

    /// Currency code stamped on quotes
    #[arg(long, env = "VECTURA_CURRENCY", default_value = "MAD")]
    currency: String,

    /// Trip request as a json file
    request: PathBuf,

    /// Quote template; the bundled document is used when omitted
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output path; derived from the vehicle and timestamp when omitted
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the quote breakdown as json instead of writing a document
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let rates = RateSource::parse(&args.rates);
    let multipliers = args.multipliers.as_deref().map(RateSource::parse);

    let table = load_table(&rates, multipliers.as_ref())?.with_currency(args.currency);
    let engine = Engine::new(ParameterStore::new(table));

    let request: TripRequest = serde_json::from_str(
        &std::fs::read_to_string(&args.request)
            .with_context(|| format!("reading {}", args.request.display()))?,
    )
    .with_context(|| format!("parsing {}", args.request.display()))?;

    let quote = engine.create_quote(&request)?;

    tracing::info!(
        vehicle = %quote.request.vehicle,
        total = %quote.total,
        currency = %quote.currency,
        "priced trip"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&quote)?);
        return Ok(());
    }

    let template = match &args.template {
        Some(path) => Template::from_path(path)?,
        None => Template::default_quote(),
    };

    let stamp = RenderStamp::now();
    let document = engine.render_quote_with_stamp(&quote, &template, &stamp)?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(document_name(&quote, &stamp)));

    std::fs::write(&out, document).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), "wrote quote document");

    Ok(())
}
