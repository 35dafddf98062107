use anyhow::Context;
use clap::{Parser, Subcommand};
use movie_roulette::config::Config;
use movie_roulette::filters::FilterSelection;
use movie_roulette::roulette::Roulette;
use movie_roulette::types::EnrichmentRecord;
use movie_roulette::{logging, metrics, server, PickerError};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "movie_roulette")]
#[command(about = "Random movie picker with streaming availability")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config.toml)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Draw one movie from the shuffle bag and print it
    Pick {
        #[arg(long, default_value = "Any")]
        rated: String,
        #[arg(long, default_value = "Any")]
        genre: String,
        /// One of <90, 90-120, 120-150, 150+
        #[arg(long, default_value = "Any")]
        runtime: String,
    },
    /// Look up poster, plot and streaming providers for a title
    Details {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: Option<u16>,
    },
}

fn print_details(details: &EnrichmentRecord) {
    if let Some(poster) = &details.poster {
        println!("   Poster: {}", poster);
    }
    if !details.plot.is_empty() {
        println!("   Plot: {}", details.plot);
    }
    if details.providers.is_empty() {
        println!("   Streaming: none found");
    }
    for provider in &details.providers {
        match &provider.url {
            Some(url) => println!("   📺 {} ({})", provider.name, url),
            None => println!("   📺 {}", provider.name),
        }
    }
    for (source, message) in &details.errors {
        println!("   ⚠️  {}: {}", source, message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging();
    let cli = Cli::parse();

    let config = Config::load().context("loading configuration")?;
    let app = Roulette::from_config(&config)
        .await
        .context("loading movie data")?;

    match cli.command {
        Commands::Serve { port } => {
            metrics::init_metrics();
            let port = port.unwrap_or(config.server.port);
            info!("Serving {} movies", app.movies().len());
            server::start_server(Arc::new(app), &config.paths.static_dir, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {}", e))?;
        }
        Commands::Pick {
            rated,
            genre,
            runtime,
        } => {
            let selection = FilterSelection {
                rated,
                genre,
                runtime,
            };
            match app.pick(&selection).await {
                Ok(pick) => {
                    let year = pick
                        .movie
                        .year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "N/A".to_string());
                    println!("\n🎬 {} ({})", pick.movie.title, year);
                    println!("   {} matching movies", pick.count);
                    print_details(&pick.details);
                }
                Err(PickerError::EmptyCandidates) => {
                    println!("❌ No movies match those filters");
                }
                Err(e) => {
                    error!("Pick failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Details { title, year } => {
            let details = app.enricher().get_details(&title, year).await;
            println!("\n🎬 {}", title);
            print_details(&details);
        }
    }
    Ok(())
}
