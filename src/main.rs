use hybridrank::cli::{Cli, Commands, ConfigAction};
use hybridrank::config::{Config, ConfigValidator};
use hybridrank::corpus::DocumentStore;
use hybridrank::error::{HybridError, Result};
use hybridrank::retrieval::{HybridSearcher, SearchRequest};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    let outcome = match cli.command {
        Commands::Search {
            corpus,
            request,
            debug,
        } => cmd_search(cli.config, &corpus, request, debug),
        Commands::Config { action } => cmd_config(cli.config, action),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), "{}", e);
            let body = serde_json::json!({
                "error": { "kind": e.kind(), "message": e.to_string() }
            });
            println!("{}", body);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "hybridrank=debug" } else { "hybridrank=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_search(
    config_path: Option<PathBuf>,
    corpus: &Path,
    request_path: Option<PathBuf>,
    debug: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    let request = read_request(request_path.as_deref())?;
    let store = DocumentStore::from_jsonl(corpus, &config.index)?;
    let searcher = HybridSearcher::new(Arc::new(store), &config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| HybridError::Io {
            source: e,
            context: "Failed to create tokio runtime".to_string(),
        })?;

    if debug {
        let rows = runtime.block_on(searcher.search_debug(&request))?;
        print_json(&rows)
    } else {
        let rows = runtime.block_on(searcher.search(&request))?;
        print_json(&rows)
    }
}

fn read_request(path: Option<&Path>) -> Result<SearchRequest> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| HybridError::Io {
            source: e,
            context: format!("Failed to read request file: {:?}", path),
        })?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|e| HybridError::Io {
                    source: e,
                    context: "Failed to read request from stdin".to_string(),
                })?;
            raw
        }
    };

    serde_json::from_str(&raw).map_err(|e| HybridError::Json {
        source: e,
        context: "Failed to parse search request".to_string(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| HybridError::Json {
        source: e,
        context: "Failed to serialize results".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            eprintln!("✓ Configuration is valid");
            eprintln!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                eprintln!("Configuration file already exists at: {}", path.display());
                eprintln!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| HybridError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            eprintln!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let explicit = config_path.is_some();
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        if explicit {
            return Err(HybridError::ConfigNotFound { path });
        }
        tracing::debug!(
            "Config file not found, using defaults. Run 'hybridrank config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    Config::load(&path)
}
