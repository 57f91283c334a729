//! Daily Digest CLI - build a morning briefing and show or email it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_digest::{DigestConfig, Pipeline};

/// Daily Digest - news, weather, calendar and a quote in one short summary.
#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(about = "Personalized daily digest, shown or emailed")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a digest and print it with its raw sections
    Show {
        /// Name used in the greeting (default: DIGEST_RECIPIENT_NAME)
        #[arg(long)]
        name: Option<String>,

        /// City for the weather (default: WEATHER_LOCATION)
        #[arg(long)]
        city: Option<String>,
    },

    /// Build a digest and email it to RECIPIENT_EMAIL (for cron use)
    Send,

    /// Complete Google authorization once and store the token
    Auth,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Real environment wins over .env
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG overrides the defaults
    let default_filter = if cli.verbose {
        "daily_digest=debug,info"
    } else {
        "daily_digest=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) => {
            if let Some(e) = dotenv_problem(e) {
                tracing::warn!(error = %e, "Ignoring unreadable .env");
            }
        }
    }

    let config = DigestConfig::from_env().context("Invalid configuration")?;
    tracing::debug!(
        providers = config.configured_providers(),
        city = %config.default_city,
        "Loaded configuration"
    );
    let pipeline = Pipeline::from_config(config)?;

    match cli.command {
        Commands::Show { name, city } => run_show(&pipeline, name, city).await,
        Commands::Send => run_send(&pipeline).await,
        Commands::Auth => run_auth(&pipeline).await,
    }
}

/// A missing `.env` is normal; anything else is worth a warning.
fn dotenv_problem(error: dotenvy::Error) -> Option<dotenvy::Error> {
    (!error.not_found()).then_some(error)
}

async fn run_show(
    pipeline: &Pipeline,
    name: Option<String>,
    city: Option<String>,
) -> Result<()> {
    let name = name.unwrap_or_else(|| pipeline.config().recipient_name.clone());
    let city = city.unwrap_or_else(|| pipeline.config().default_city.clone());
    let digest = pipeline.run_interactive(&name, &city).await;

    println!("\n{}", "🌅 Your Daily Digest".bold().green());
    println!("{}\n", "─".repeat(40).dimmed());
    println!("{}\n", digest.summary.text);
    match digest.summary.provider {
        Some(provider) => println!("{}", format!("Summarized by {}", provider.name()).dimmed()),
        None => println!("{}", "No summary provider available, showing plain digest".dimmed()),
    }

    println!("\n{}", "📰 News".bold());
    for headline in &digest.input.news {
        println!("  {headline}");
    }

    println!("\n{}", format!("☀️  Weather in {city}").bold());
    println!("  {}", digest.input.weather);

    println!("\n{}", "📅 Calendar".bold());
    for event in &digest.input.calendar {
        println!("  {event}");
    }

    println!("\n{}", "💬 Quote".bold());
    println!("  {}\n", digest.input.quote);

    Ok(())
}

async fn run_send(pipeline: &Pipeline) -> Result<()> {
    let outcome = pipeline
        .run_batch()
        .await
        .context("Failed to deliver daily digest")?;

    println!(
        "{} {} → {}",
        "✓".green().bold(),
        outcome.subject,
        outcome.recipient.cyan()
    );
    Ok(())
}

async fn run_auth(pipeline: &Pipeline) -> Result<()> {
    let credentials = pipeline
        .authorize()
        .await
        .context("Google authorization failed")?;

    println!(
        "{} Credentials stored at {}",
        "✓".green().bold(),
        pipeline.config().token_file.display().to_string().cyan()
    );
    if credentials.can_refresh() {
        println!("  Refresh token present, batch runs can renew access unattended.");
    } else {
        println!(
            "  {}",
            "No refresh token granted; batch runs will need consent again once it expires."
                .yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_show_name_defers_to_config() {
        let cli = Cli::try_parse_from(["daily-digest", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Show {
                name: None,
                city: None
            }
        ));

        let cli = Cli::try_parse_from(["daily-digest", "show", "--name", "Asha"]).unwrap();
        match cli.command {
            Commands::Show { name, .. } => assert_eq!(name.as_deref(), Some("Asha")),
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_dotenv_problems() {
        let dir = TempDir::new().unwrap();

        let missing = dotenvy::from_path(dir.path().join(".env")).unwrap_err();
        assert!(dotenv_problem(missing).is_none());

        let malformed = dir.path().join("broken.env");
        std::fs::write(&malformed, "THIS IS NOT A VALID LINE\n").unwrap();
        let err = dotenvy::from_path(&malformed).unwrap_err();
        assert!(dotenv_problem(err).is_some());
    }
}
