use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use rpc_access_filter::config::loader::load_properties;
use rpc_access_filter::config::{CompositeFilterConfig, DEFAULT_PREFIX};
use rpc_access_filter::filter::{CompositeFilter, Filter, FilterResult};
use rpc_access_filter::rpc::{MessageContext, Params, RpcError};
use rpc_access_filter::security::ApiKey;
use rpc_access_filter::Request;

#[derive(Parser)]
#[command(name = "access-cli")]
#[command(about = "Inspect and exercise JSON-RPC access policies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one request against an access policy
    Check {
        /// Access properties file
        #[arg(short, long)]
        properties: PathBuf,

        /// Property key prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        /// Method name
        #[arg(short, long)]
        method: String,

        /// Parameters as JSON (array or object)
        #[arg(long)]
        params: Option<String>,

        /// Client IP address
        #[arg(long, default_value = "127.0.0.1")]
        client: String,

        /// Treat the request as received over HTTPS
        #[arg(long)]
        secure: bool,

        /// Verified client certificate subject DN (repeatable)
        #[arg(long)]
        principal: Vec<String>,
    },
    /// Generate new API keys
    Keygen {
        /// Number of keys
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Methods to grant, printed as a ready-to-use property line
        #[arg(long, default_value = "*")]
        methods: String,

        /// Property key prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,
    },
}

fn parse_params(params: Option<&str>) -> Result<Params, String> {
    let Some(text) = params else {
        return Ok(Params::None);
    };
    match serde_json::from_str::<Value>(text).map_err(|e| format!("invalid --params: {e}"))? {
        Value::Null => Ok(Params::None),
        Value::Array(list) => Ok(Params::Positional(list)),
        Value::Object(map) => Ok(Params::Named(map)),
        _ => Err("--params must be a JSON array or object".to_string()),
    }
}

fn decision(result: FilterResult) -> Value {
    match result {
        FilterResult::Allowed => json!({ "allowed": true }),
        FilterResult::Denied(reason) => json!({
            "allowed": false,
            "reason": reason.as_str(),
            "error": RpcError::from(reason),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn check(
    properties: PathBuf,
    prefix: String,
    method: String,
    params: Option<String>,
    client: String,
    secure: bool,
    principal: Vec<String>,
) -> Result<FilterResult, Box<dyn std::error::Error>> {
    let props = load_properties(&properties)?;
    let config = CompositeFilterConfig::from_properties_with_prefix(&prefix, &props)?;
    let filter = CompositeFilter::new(config)?;

    let request = Request::new(method, parse_params(params.as_deref())?);
    let context = MessageContext::new()
        .secure(secure)
        .with_client_address(client)
        .with_principals(principal);

    Ok(filter.evaluate(&request, &context))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            properties,
            prefix,
            method,
            params,
            client,
            secure,
            principal,
        } => match check(properties, prefix, method, params, client, secure, principal) {
            Ok(result) => {
                println!("{}", decision(result));
                if result.is_allowed() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(1)
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(2)
            }
        },
        Commands::Keygen {
            count,
            methods,
            prefix,
        } => {
            for _ in 0..count {
                let key = ApiKey::generate();
                println!("{prefix}apiKeys.map.{key}={methods}");
            }
            ExitCode::SUCCESS
        }
    }
}
