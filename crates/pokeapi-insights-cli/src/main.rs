//! pokeapi-insights — entry point.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::json;

use pokeapi_insights::queries;
use pokeapi_insights::{ClientConfig, Direction, PokeClient, Ranked, Report, SpeciesFilter};

#[derive(Parser)]
#[command(
    name = "pokeapi-insights",
    about = "Answer analytical questions over the PokeAPI",
    version
)]
struct Cli {
    /// API base URL (also POKEAPI_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Attempts per request, including the first (also POKEAPI_MAX_ATTEMPTS).
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Linear backoff unit in milliseconds (also POKEAPI_BACKOFF_MS).
    #[arg(long, global = true)]
    backoff_ms: Option<u64>,

    /// Per-request timeout in seconds (also POKEAPI_TIMEOUT_SECS).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Detail requests kept in flight at once (also POKEAPI_CONCURRENCY).
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Output results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the standard question set (default).
    Report,

    /// Count distinct species of a type introduced in a generation.
    Count {
        #[arg(long, default_value = "fire")]
        r#type: String,
        #[arg(long, default_value = "generation-i")]
        generation: String,
    },

    /// List Pokémon of a type whose attribute meets a threshold.
    Tall {
        #[arg(long, default_value = "water")]
        r#type: String,
        #[arg(long, default_value = "height")]
        attribute: String,
        #[arg(long, default_value = "11")]
        min: i64,
    },

    /// Top Pokémon of a type by base stat.
    Top {
        #[arg(long, default_value = "dragon")]
        r#type: String,
        #[arg(long, default_value = "attack")]
        stat: String,
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Print a species' evolution chain.
    Chain {
        #[arg(default_value = "bulbasaur")]
        species: String,
    },

    /// Species of a type with no evolutions at all.
    Loners {
        #[arg(long, default_value = "electric")]
        r#type: String,
    },

    /// Highest base stat among species of one generation.
    Strongest {
        #[arg(long, default_value = "generation-ii")]
        generation: String,
        #[arg(long, default_value = "attack")]
        stat: String,
    },

    /// Highest base stat among non-legendary species.
    Fastest {
        #[arg(long, default_value = "speed")]
        stat: String,
    },

    /// Pokémon with the smallest value of a top-level attribute.
    Lightest {
        #[arg(long, default_value = "weight")]
        attribute: String,
    },

    /// Most common habitat among a type's species.
    Habitat {
        #[arg(long, default_value = "grass")]
        r#type: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

impl Cli {
    /// CLI flags over `POKEAPI_*` environment variables over defaults.
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(n) = self.max_attempts {
            config = config.with_max_attempts(n);
        }
        if let Some(ms) = self.backoff_ms {
            config = config.with_base_delay(Duration::from_millis(ms));
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.client_config();
    let json_output = cli.json;
    let command = cli.command.unwrap_or(Commands::Report);

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "pokeapi-insights", &mut std::io::stdout());
        return Ok(());
    }

    tracing::info!("PokeAPI: {} (concurrency {})", config.base_url, config.concurrency);
    let client = PokeClient::new(&config)?;

    match command {
        Commands::Report => {
            let report = Report::collect(&client).await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
        }

        Commands::Count { r#type, generation } => {
            let count = queries::count_in_generation(&client, &r#type, &generation).await?;
            emit(
                json_output,
                json!({ "type": r#type, "generation": generation, "count": count }),
                format!("{} species from {generation}: {count}", r#type),
            );
        }

        Commands::Tall {
            r#type,
            attribute,
            min,
        } => {
            let names = queries::members_at_least(&client, &r#type, &attribute, min).await?;
            emit(
                json_output,
                json!({ "type": r#type, "attribute": attribute, "min": min, "names": names }),
                format!("{} Pokémon with {attribute} >= {min}: {names:?}", r#type),
            );
        }

        Commands::Top { r#type, stat, k } => {
            let top = queries::top_by_stat(&client, &r#type, &stat, k).await?;
            let text = top
                .iter()
                .enumerate()
                .map(|(i, ranked)| format!("{:>2}. {ranked}", i + 1))
                .collect::<Vec<_>>()
                .join("\n");
            emit(
                json_output,
                json!({ "type": r#type, "stat": stat, "top": top }),
                format!("Top {k} {} Pokémon by {stat}:\n{text}", r#type),
            );
        }

        Commands::Chain { species } => {
            let chain = queries::evolution_chain(&client, &species).await?;
            emit(
                json_output,
                json!({ "species": species, "chain": chain }),
                format!("Evolution chain of {species}: {}", chain.join(" -> ")),
            );
        }

        Commands::Loners { r#type } => {
            let names = queries::without_evolutions(&client, &r#type).await?;
            emit(
                json_output,
                json!({ "type": r#type, "names": names }),
                format!("{} species without evolutions: {names:?}", r#type),
            );
        }

        Commands::Strongest { generation, stat } => {
            let filter = SpeciesFilter::Generation(generation.clone());
            let best = queries::species_stat_extremum(&client, &filter, &stat, Direction::Max).await?;
            emit(
                json_output,
                json!({ "generation": generation, "stat": stat, "best": best }),
                format!("Highest base {stat} in {generation}: {}", describe(best.as_ref())),
            );
        }

        Commands::Fastest { stat } => {
            let best = queries::species_stat_extremum(
                &client,
                &SpeciesFilter::NonLegendary,
                &stat,
                Direction::Max,
            )
            .await?;
            emit(
                json_output,
                json!({ "stat": stat, "best": best }),
                format!("Highest base {stat} among non-legendaries: {}", describe(best.as_ref())),
            );
        }

        Commands::Lightest { attribute } => {
            let best = queries::entity_attribute_extremum(&client, &attribute, Direction::Min).await?;
            emit(
                json_output,
                json!({ "attribute": attribute, "best": best }),
                format!("Lowest {attribute}: {}", describe(best.as_ref())),
            );
        }

        Commands::Habitat { r#type } => {
            let mode = queries::most_common_habitat(&client, &r#type).await?;
            emit(
                json_output,
                json!({ "type": r#type, "habitat": mode.value, "count": mode.count }),
                format!(
                    "Most common habitat among {} species: {} ({} species)",
                    r#type, mode.value, mode.count
                ),
            );
        }

        Commands::Completions { .. } => unreachable!("handled before the client is built"),
    }

    Ok(())
}

fn describe(ranked: Option<&Ranked>) -> String {
    ranked
        .map(Ranked::to_string)
        .unwrap_or_else(|| "none".to_string())
}

fn emit(json_output: bool, value: serde_json::Value, text: String) {
    if json_output {
        match serde_json::to_string_pretty(&value) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => tracing::error!("failed to render JSON: {e}"),
        }
    } else {
        println!("{text}");
    }
}
