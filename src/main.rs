use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pubmed_gateway::{
    CacheBackendConfig, ClientConfig, LiteratureService, PubMedClient, SearchRequest,
};

#[derive(Parser)]
#[command(
    name = "pubmed-gateway",
    about = "Search PubMed through a caching, rate-aware gateway",
    long_about = "Command-line front end for the PubMed gateway. Results are printed as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for NCBI E-utilities (increases rate limit)
    #[arg(long, env = "NCBI_API_KEY", global = true)]
    api_key: Option<String>,

    /// Redis URL for a shared response cache (needs the cache-redis feature)
    #[arg(long, global = true, conflicts_with = "no_cache")]
    redis_url: Option<String>,

    /// Send every request upstream
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Search field tag, e.g. [AU] for author
    #[arg(short, long)]
    field: Option<String>,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
    max_results: u16,

    /// Earliest publication date (YYYY/MM/DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Latest publication date (YYYY/MM/DD)
    #[arg(long)]
    end_date: Option<String>,
}

impl SearchArgs {
    fn to_request(&self) -> SearchRequest {
        let mut request =
            SearchRequest::new(self.query.clone()).with_max_results(self.max_results as usize);
        if let Some(field) = &self.field {
            request = request.with_field(field.clone());
        }
        if let Some(start) = &self.start_date {
            request = request.with_start_date(start.clone());
        }
        if let Some(end) = &self.end_date {
            request = request.with_end_date(end.clone());
        }
        request
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search and return full article records
    Search(SearchArgs),
    /// Search and return brief summaries
    Summary(SearchArgs),
    /// Search clinical guidelines with free full text
    Guidelines {
        /// Topic to search guidelines for
        query: String,
        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
        max_results: u16,
    },
    /// Search and return AMA citations with links
    Citations(SearchArgs),
    /// Related articles with a demonstration similarity score
    Semantic {
        /// PMID of the source article
        pmid: String,
        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
        max_results: u16,
    },
    /// Check spelling of a search term
    #[command(name = "spell-check")]
    SpellCheck {
        /// Short search phrase
        query: String,
    },
    /// Fetch one article by PMID
    Article {
        /// PubMed ID
        pmid: String,
    },
}

fn build_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key.clone());
    }
    if cli.no_cache {
        config.cache.backend = CacheBackendConfig::Disabled;
    } else if let Some(url) = &cli.redis_url {
        config.cache.backend = CacheBackendConfig::redis_or_memory(url.clone());
    }
    config
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let client = PubMedClient::with_config(build_config(&cli));
    let service = LiteratureService::new(client);

    match &cli.command {
        Commands::Search(args) => print_json(&service.search_articles(&args.to_request()).await),
        Commands::Summary(args) => print_json(&service.search_summaries(&args.to_request()).await),
        Commands::Guidelines { query, max_results } => {
            print_json(&service.search_guidelines(query, *max_results as usize).await)
        }
        Commands::Citations(args) => {
            print_json(&service.search_citations(&args.to_request()).await)
        }
        Commands::Semantic { pmid, max_results } => {
            match service.semantic_search(pmid, *max_results as usize).await {
                Some(results) => print_json(&results),
                None => bail!("Source article with PMID {} not found", pmid),
            }
        }
        Commands::SpellCheck { query } => print_json(&service.client().spell_check(query).await),
        Commands::Article { pmid } => match service.client().fetch_details(pmid).await {
            Some(article) => print_json(&article),
            None => bail!("Article with PMID {} not found", pmid),
        },
    }
}
