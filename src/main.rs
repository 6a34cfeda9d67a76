use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Result, anyhow};
use clap::Parser;
use dictionary_search_rust::{Backend, Config, logging, server, settings};

#[derive(Parser, Debug)]
#[command(
    name = "dictionary-search-rust",
    version,
    about = "Search a bilingual dictionary by phrase"
)]
struct Cli {
    /// Phrase to look up (read from stdin when omitted)
    phrase: Option<String>,

    /// Language pair (enru, deru)
    #[arg(short = 'l', long = "lang", default_value = "enru")]
    lang: String,

    /// Proximity search instead of exact match
    #[arg(short = 'f', long = "fuzzy")]
    fuzzy: bool,

    /// Zero-based result page for --fuzzy
    #[arg(short = 'p', long = "page", default_value_t = 0)]
    page: usize,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Use empty in-memory indexes instead of Solr
    #[arg(long = "memory")]
    memory: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Start the HTTP server on this address (e.g. 127.0.0.1:8080)
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let backend = if cli.memory {
        Backend::Memory
    } else {
        Backend::Solr
    };

    if let Some(addr) = cli.server {
        let settings = settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
        logging::init(cli.verbose || settings.verbose)?;
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr
        };
        return server::run_server(settings, addr, backend).await;
    }

    logging::init(cli.verbose)?;
    let input = match cli.phrase {
        Some(phrase) => Some(phrase),
        None if io::stdin().is_terminal() => {
            return Err(anyhow!("no phrase given; pass it as an argument or on stdin"));
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
    };

    let output = dictionary_search_rust::run(
        Config {
            lang: cli.lang,
            fuzzy: cli.fuzzy,
            page: cli.page,
            settings_path: cli.read_settings,
            backend,
        },
        input,
    )
    .await?;

    println!("{}", output);
    Ok(())
}
