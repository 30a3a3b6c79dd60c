use clap::{Parser, Subcommand};
use http::{Method, StatusCode};
use request_logging::config::{LoggingConfig, LoggingProperties, MaskRule, SideFilters};
use request_logging::{mask, LoggingError, PolicyEvaluator};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Request logging: inspect and check logging policies
#[derive(Parser)]
#[command(name = "request-logging", version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to configuration file (.hcl or .toml)
        #[arg(short, long, default_value = "logging.hcl")]
        config: String,
    },
    /// Show every logging decision for one request
    Explain {
        /// Path to configuration file (.hcl or .toml)
        #[arg(short, long, default_value = "logging.hcl")]
        config: String,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path (e.g., /api/users/42)
        #[arg(short, long)]
        path: String,

        /// Content type of the request or response
        #[arg(long)]
        content_type: Option<String>,

        /// Response status code
        #[arg(long)]
        status: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> request_logging::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Commands::Validate { config } => validate_config(&config).await,
        Commands::Explain {
            config,
            method,
            path,
            content_type,
            status,
        } => {
            let config = load_config(&config).await?;
            explain(config, &method, &path, content_type.as_deref(), status)
        }
    }
}

/// Load and validate a configuration file, exiting on failure
async fn load_config(path: &str) -> request_logging::Result<LoggingConfig> {
    if !std::path::Path::new(path).exists() {
        eprintln!("✗ Config file not found: {}", path);
        std::process::exit(1);
    }

    let props = match LoggingProperties::from_file(path).await {
        Ok(p) => {
            tracing::debug!(config = path, "Configuration parsed");
            p
        }
        Err(e) => {
            eprintln!("✗ Parse error: {}", e);
            std::process::exit(1);
        }
    };

    match props.into_config() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("✗ Validation error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Validate a configuration file and print a summary
async fn validate_config(path: &str) -> request_logging::Result<()> {
    let config = load_config(path).await?;

    println!("✓ Configuration is valid ({})", path);
    println!();
    println!("  Enabled:       {}", config.enabled);
    println!("  Time elapsed:  {}", config.include_time_elapsed);
    println!(
        "  Status codes:  {}",
        config
            .status_codes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Request:       enabled={} headers={} payload={} query_params={}",
        config.request.enabled,
        config.request.include_headers,
        config.request.include_payload,
        config.request.include_query_params
    );
    print_filters(&config.request.filters);
    println!(
        "  Response:      enabled={} headers={} payload={}",
        config.response.enabled, config.response.include_headers, config.response.include_payload
    );
    print_filters(&config.response.filters);

    Ok(())
}

fn print_filters(filters: &SideFilters) {
    println!("    max payload: {} bytes", filters.max_payload_size);
    if !filters.white_listed_content_types.is_empty() {
        println!(
            "    content types (white): {}",
            filters.white_listed_content_types.join(", ")
        );
    }
    if !filters.black_listed_content_types.is_empty() {
        println!(
            "    content types (black): {}",
            filters.black_listed_content_types.join(", ")
        );
    }
    if !filters.white_listed_servlet_paths.is_empty() {
        println!(
            "    paths (white): {}",
            filters.white_listed_servlet_paths.join(", ")
        );
    }
    if !filters.black_listed_servlet_paths.is_empty() {
        println!(
            "    paths (black): {}",
            filters.black_listed_servlet_paths.join(", ")
        );
    }
    println!("    masks: {}", filters.masks.len());
}

/// Print the policy decisions for one request
fn explain(
    config: LoggingConfig,
    method: &str,
    path: &str,
    content_type: Option<&str>,
    status: Option<u16>,
) -> request_logging::Result<()> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|e| LoggingError::Config(format!("Invalid method '{}': {}", method, e)))?;
    let status = status
        .map(StatusCode::from_u16)
        .transpose()
        .map_err(|e| LoggingError::Config(format!("Invalid status code: {}", e)))?;

    let policy = PolicyEvaluator::new(Arc::new(config));
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("{} {}", method, path);
    println!();
    println!("  Log request:            {}", yes_no(policy.should_log_request(path)));
    println!(
        "  Capture request body:   {}",
        yes_no(policy.should_capture_request_body(path, &method, content_type))
    );
    println!("  Log response:           {}", yes_no(policy.should_log_response(path)));
    println!(
        "  Buffer response body:   {}",
        yes_no(policy.should_buffer_response(path))
    );
    println!(
        "  Log response body:      {}",
        yes_no(policy.should_capture_response_body(path, content_type))
    );
    match status {
        Some(status) => println!(
            "  Emit for status {}:    {}",
            status.as_u16(),
            yes_no(policy.should_emit(Some(status)))
        ),
        None => println!("  Emit (status unknown): {}", yes_no(policy.should_emit(None))),
    }

    let config = policy.config();
    print_rules(
        "Request masks",
        &mask::resolve(&config.request.filters.masks, &method, path),
    );
    print_rules(
        "Response masks",
        &mask::resolve(&config.response.filters.masks, &method, path),
    );

    Ok(())
}

fn print_rules(title: &str, rules: &[&MaskRule]) {
    println!();
    println!("  {}: {}", title, rules.len());
    for rule in rules {
        let method = rule.method.as_ref().map_or("*", Method::as_str);
        println!("    - {} {}", method, rule.path_matcher);
        if !rule.masked_headers().is_empty() {
            println!("        headers:      {}", rule.masked_headers().join(", "));
        }
        if !rule.masked_query_params().is_empty() {
            println!("        query params: {}", rule.masked_query_params().join(", "));
        }
        if !rule.masked_json_fields().is_empty() {
            println!("        json fields:  {}", rule.masked_json_fields().join(", "));
        }
    }
}
