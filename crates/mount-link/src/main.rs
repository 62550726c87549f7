//! mountctl: send commands to an OnStep mount from the shell.
//!
//! Usage:
//!   mountctl send ':GVP#'
//!   mountctl batch ':GR#' ':GD#'
//!   mountctl axes [--count <n>]

use clap::{Parser, Subcommand};
use mount_link::{AxisDriverSet, Dispatcher, ErrorCallback, HttpTransport, LinkConfig, LinkResult, MountStatus};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// mountctl: talk to an OnStep SmartWebServer.
#[derive(Parser, Debug)]
#[command(name = "mountctl")]
#[command(about = "Send LX200 commands to an OnStep mount over its SmartWebServer")]
struct Args {
    /// Base URL of the SmartWebServer.
    #[arg(long, env = "MOUNT_URL")]
    url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Send one command and print the raw reply
    Send {
        command: String,

        /// Mark the log entry as system traffic
        #[arg(long)]
        system: bool,
    },

    /// Send commands as one batch and print one reply per line
    Batch {
        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Poll axis driver diagnostics once and print them as JSON
    Axes {
        /// Number of axes to poll
        #[arg(long)]
        count: Option<usize>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> LinkResult<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = LinkConfig::from_env()?;
    if let Some(url) = args.url.as_deref() {
        config.base_url = LinkConfig::new(url)?.base_url;
    }

    info!(url = %config.base_url, "Configuration loaded");

    let on_error: ErrorCallback = Arc::new(|message: &str| error!(reason = %message, "Command rejected"));
    let transport = Arc::new(HttpTransport::new(config.clone()));
    let dispatcher = Dispatcher::detached(transport, on_error);

    let result = run(&dispatcher, &config, args.command).await;
    dispatcher.disconnect();

    if let Err(ref e) = result {
        error!(error = %e, "mountctl failed");
    }
    result
}

async fn run(dispatcher: &Dispatcher, config: &LinkConfig, action: Action) -> LinkResult<()> {
    match action {
        Action::Send { command, system } => {
            let reply = dispatcher.send_command(&command, system).await?;
            println!("{reply}");
        }
        Action::Batch { commands } => {
            for reply in dispatcher.send_command_array(&commands).await? {
                println!("{reply}");
            }
        }
        Action::Axes { count } => {
            let mut axes = AxisDriverSet::new(count.unwrap_or(config.axis_count));
            axes.poll(dispatcher).await?;

            let status = MountStatus {
                axes: axes.statuses(),
                ..dispatcher.status()
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
