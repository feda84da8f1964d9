// command line interface

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::core::relay::DEFAULT_BASE_URL;
use crate::{Chat, ChatRequest, Moderation, OpenAi, Server};

#[derive(Parser)]
#[command(name = "wally", about = "Family-friendly chat relay", version)]
struct Cli {
    /// openai api key
    #[arg(long, short = 'k', env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// base url of the chat completions api
    #[arg(long, env = "WALLY_UPSTREAM_URL", default_value = DEFAULT_BASE_URL, global = true)]
    upstream_url: String,

    /// seconds to wait for the upstream before falling back
    #[arg(long, env = "WALLY_TIMEOUT_SECS", default_value = "30", global = true)]
    timeout_secs: u64,

    /// replace the built-in blocked word list (comma separated)
    #[arg(long, env = "WALLY_BLOCKED_TERMS", value_delimiter = ',', global = true)]
    blocked_terms: Option<Vec<String>>,

    /// tracing filter, RUST_LOG takes precedence
    #[arg(long, env = "WALLY_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "7071")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// value for Access-Control-Allow-Origin
        #[arg(long, env = "WALLY_ALLOW_ORIGIN", default_value = "*")]
        allow_origin: String,
    },

    /// send one prompt through the relay and print the response envelope
    Ask {
        prompt: String,

        #[arg(long, default_value = "cli")]
        caller_id: String,

        /// display name used in replies
        #[arg(long)]
        name: Option<String>,
    },

    /// run the moderation gate on some text
    Check { text: String },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let moderation = match cli.blocked_terms {
        Some(terms) => Moderation::new(terms),
        None => Moderation::default(),
    };

    let relay = OpenAi::new(cli.api_key, cli.upstream_url);
    let chat = Chat::new(Arc::new(relay))
        .with_moderation(moderation)
        .with_timeout(Duration::from_secs(cli.timeout_secs));

    match cli.command {
        Commands::Serve {
            port,
            host,
            allow_origin,
        } => Ok(Server::run(Arc::new(chat), &allow_origin, &host, port).await?),

        Commands::Ask {
            prompt,
            caller_id,
            name,
        } => {
            let mut req = ChatRequest::new(prompt, caller_id);
            req.user_name = name;

            let envelope = chat.handle(req).await?;
            println!("{}", serde_json::to_string_pretty(&envelope).into_diagnostic()?);
            Ok(())
        }

        Commands::Check { text } => {
            let verdict = chat.moderation().evaluate(&text);
            println!("{}", serde_json::to_string_pretty(&verdict).into_diagnostic()?);
            Ok(())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("warn: '{level}' is not a valid log filter ({e}), using 'info'");
                EnvFilter::new("info")
            }
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
