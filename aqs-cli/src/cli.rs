use anyhow::{Context, Result, bail};
use aqs_core::{
    AqsClient, Area, Config, Credentials, DailyQuery, Endpoint, QueryTemplate, YearlyAqi,
    daily_records, header_status, is_success, mean_aqi, render_csv, split_county_fips,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "aqs", version, about = "EPA AQS air-quality CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store AQS API credentials (email + key).
    Configure,

    /// Query one of the lookup endpoints.
    List {
        #[command(subcommand)]
        target: ListTarget,
    },

    /// Fetch daily summaries year by year and write the yearly mean-AQI series.
    Fetch(FetchArgs),
}

#[derive(Debug, Subcommand)]
pub enum ListTarget {
    /// Parameter classes known to the service.
    Classes,

    /// Parameters belonging to one class.
    Parameters {
        /// Class code, e.g. "AQI POLLUTANTS".
        #[arg(long = "class")]
        class: String,
    },

    /// Monitoring sites in a county.
    Sites {
        /// 5-digit county FIPS code (2-digit state + 3-digit county).
        #[arg(long)]
        fips: String,
    },
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// 5-digit county FIPS code (2-digit state + 3-digit county).
    #[arg(long)]
    pub fips: String,

    /// Comma-separated AQS parameter codes (the service caps one request at five).
    #[arg(long)]
    pub params: String,

    /// First year of the series.
    #[arg(long)]
    pub from_year: i32,

    /// Last year of the series (inclusive).
    #[arg(long)]
    pub to_year: i32,

    /// MMDD start of the window within each year.
    #[arg(long, default_value = "0101")]
    pub season_begin: String,

    /// MMDD end of the window within each year.
    #[arg(long, default_value = "1231")]
    pub season_end: String,

    /// Where to write the year,mean_aqi CSV.
    #[arg(long, default_value = "aqi_by_year.csv")]
    pub output: PathBuf,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::List { target } => list(target).await,
            Command::Fetch(args) => fetch(args).await,
        }
    }
}

fn configure() -> Result<()> {
    let email = inquire::Text::new("AQS account email:").prompt()?;
    let key = inquire::Text::new("AQS API key:").prompt()?;

    let mut config = Config::load()?;
    config.set_credentials(Credentials { email, key });
    config.save()?;

    println!("Credentials saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn client_from_config() -> Result<AqsClient> {
    let config = Config::load()?;
    Ok(AqsClient::new(config.credentials()?))
}

async fn list(target: ListTarget) -> Result<()> {
    let client = client_from_config()?;

    let (endpoint, overrides) = match target {
        ListTarget::Classes => (Endpoint::ListClasses, QueryTemplate::new()),
        ListTarget::Parameters { class } => (
            Endpoint::ListParametersByClass,
            QueryTemplate::new().set("pclass", class),
        ),
        ListTarget::Sites { fips } => {
            let (state, county) = split_county_fips(&fips)?;
            (
                Endpoint::ListSitesByCounty,
                QueryTemplate::new().set("state", state).set("county", county),
            )
        }
    };

    let body = client.list_info(endpoint, &overrides).await?;
    if !is_success(&body) {
        bail!(
            "service returned status {:?} for {endpoint}",
            header_status(&body).unwrap_or("<missing>")
        );
    }

    let data = body.get("Data").cloned().unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn fetch(args: FetchArgs) -> Result<()> {
    if args.to_year < args.from_year {
        bail!("--to-year must not precede --from-year");
    }

    let client = client_from_config()?;
    let mut series: Vec<YearlyAqi> = Vec::new();

    for year in args.from_year..=args.to_year {
        let query =
            DailyQuery::for_year(args.params.as_str(), year, &args.season_begin, &args.season_end)?
            .with_area(Area::CountyFips(args.fips.clone()));

        let body = match client
            .daily_summary(Endpoint::DailyByCounty, &query, &QueryTemplate::new())
            .await
        {
            Ok(body) => body,
            // A window that fails validation for one year fails for them all.
            Err(err) if err.is_validation() => return Err(err.into()),
            Err(err) => {
                log::warn!("{year}: request failed, skipping year: {err}");
                continue;
            }
        };

        if !is_success(&body) {
            log::warn!(
                "{year}: service returned status {:?}, skipping year",
                header_status(&body).unwrap_or("<missing>")
            );
            continue;
        }

        let records = daily_records(&body)?;
        match mean_aqi(&records) {
            Some(mean) => {
                println!("{year}: mean AQI {mean:.1} across {} records", records.len());
                series.push(YearlyAqi {
                    year,
                    mean_aqi: mean,
                });
            }
            None => println!("{year}: no non-null AQI observations"),
        }
    }

    fs::write(&args.output, render_csv(&series))
        .with_context(|| format!("Failed to write series to {}", args.output.display()))?;
    println!("Wrote {} rows to {}", series.len(), args.output.display());

    Ok(())
}
