use anyhow::{bail, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use volscraper::{
    config::Config,
    fetch::{self, SeriesRequest, WikiClient},
    wiki::ExtractError,
};

#[derive(Debug, Parser)]
#[command(name = "volscraper")]
#[command(version, about = "English light novel release dates from Wikipedia", long_about = None)]
#[command(after_help = "Flags apply to the series named just before them:
    volscraper Overlord --tables 1 \"Sword Art Online\" --slug Sword_Art_Online")]
struct Cli {
    /// Series title, as used for the article slug
    #[arg(value_name = "SERIES", required = true)]
    series: Vec<String>,

    /// Article slug to fetch instead of the one derived from the title
    #[arg(long, value_name = "SLUG")]
    slug: Vec<String>,

    /// Number of light novel tables to read
    #[arg(long, value_name = "N")]
    tables: Vec<usize>,
}

/// Index of the series whose position is the last one before `at`.
fn owner(series_at: &[usize], at: usize, flag: &str) -> Result<usize> {
    match series_at.iter().rposition(|&pos| pos < at) {
        Some(owner) => Ok(owner),
        None => bail!("--{} must follow a series name", flag),
    }
}

fn requests_from(matches: &ArgMatches) -> Result<Vec<SeriesRequest>> {
    let cli = Cli::from_arg_matches(matches)?;
    let series_at: Vec<usize> = matches.indices_of("series").into_iter().flatten().collect();
    let mut requests: Vec<SeriesRequest> =
        cli.series.into_iter().map(SeriesRequest::new).collect();

    let slug_at = matches.indices_of("slug").into_iter().flatten();
    for (at, slug) in slug_at.zip(cli.slug) {
        requests[owner(&series_at, at, "slug")?].options.slug_override = Some(slug);
    }
    let tables_at = matches.indices_of("tables").into_iter().flatten();
    for (at, n) in tables_at.zip(cli.tables) {
        requests[owner(&series_at, at, "tables")?]
            .options
            .tables_to_parse_override = Some(n);
    }
    Ok(requests)
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let requests = requests_from(&Cli::command().get_matches())?;
    let config = Config::from_env()?;
    info!(series = requests.len(), concurrency = config.concurrency, "configured");
    let client = WikiClient::new(config)?;

    // ─── 3) look up every series ─────────────────────────────────────
    let results = fetch::fetch_all(&client, &requests).await;

    let mut reports = Vec::with_capacity(results.len());
    for (req, res) in requests.iter().zip(results) {
        match res {
            Ok(report) => {
                info!(series = %req.series, volumes = report.count, "done");
                reports.push(report);
            }
            Err(e) => match e.downcast_ref::<ExtractError>() {
                Some(inner) if inner.is_internal() => {
                    error!(series = %req.series, "extractor bug: {:#}", e)
                }
                _ => error!(series = %req.series, "failed: {:#}", e),
            },
        }
    }

    // ─── 4) report ───────────────────────────────────────────────────
    println!("{}", serde_json::to_string_pretty(&reports)?);

    if reports.is_empty() {
        bail!("every series failed");
    }
    info!("all done");
    Ok(())
}
