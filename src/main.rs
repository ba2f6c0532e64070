use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use venuescout::cli::{Cli, Commands, DiscoverArgs};
use venuescout::config::AppConfig;
use venuescout::error::VenueScoutError;
use venuescout::profile::ArtistProfile;
use venuescout::{logging, parse, prompt, server};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            let config = AppConfig::load(&args.config, args.bind_addr)?;
            logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;
            config.validate()?;

            info!(
                addr = %config.bind_addr,
                model = %config.model,
                timeout_sec = config.request_timeout_secs,
                retries = config.max_retries,
                "config loaded"
            );

            runtime()?.block_on(server::serve(config))
        }
        Commands::Discover(args) => {
            let config = AppConfig::load(&args.config, None)?;
            logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;
            config.validate()?;

            runtime()?.block_on(run_discover(config, args))
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("failed to start async runtime: {e}"))
}

async fn run_discover(config: AppConfig, args: DiscoverArgs) -> anyhow::Result<()> {
    let profile = ArtistProfile {
        name: args.name,
        genre: args.genre,
        draw_size: args.draw_size,
        fee_range: args.fee_range,
        home_base: args.home_base,
        similar_artists: args.similar_artists,
    };
    profile.validate()?;
    if args.city.trim().is_empty() {
        return Err(VenueScoutError::BlankField { field: "city" }.into());
    }

    let client = server::build_client(&config)?;
    let prompt = prompt::discovery(&profile, &args.city);

    info!(city = %args.city, artist = %profile.name, "discovering venues");
    let text = client
        .send(&prompt, &config.model, config.max_tokens_discover)
        .await?;

    let venues = parse::parse_venues(&text);
    info!(count = venues.len(), "venue discovery complete");

    println!("{}", serde_json::to_string_pretty(&venues)?);
    Ok(())
}
