use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use streamwatch_common::models::platform::Platform;

mod commands;
mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "streamwatch")]
#[command(author, version, about = "Watches Twitch, YouTube and legacy channels and announces new broadcasts")]
pub struct Args {
    /// SQLite connection URL.
    #[arg(long, env = "STREAMWATCH_DB_URL", default_value = "sqlite://streamwatch.db")]
    pub db_url: String,

    /// Seconds between polls of each platform.
    #[arg(long, env = "STREAMWATCH_POLL_INTERVAL", default_value_t = 300)]
    pub poll_interval_secs: u64,

    /// Upper bound in seconds for one platform API call.
    #[arg(long, env = "STREAMWATCH_ADAPTER_TIMEOUT", default_value_t = 30)]
    pub adapter_timeout_secs: u64,

    /// Reconnect grace period for Twitch, in seconds.
    #[arg(long, env = "STREAMWATCH_TWITCH_RECENT_WINDOW", default_value_t = 1800)]
    pub twitch_recent_window_secs: i64,

    /// Reconnect grace period for YouTube, in seconds.
    #[arg(long, env = "STREAMWATCH_YOUTUBE_RECENT_WINDOW", default_value_t = 1800)]
    pub youtube_recent_window_secs: i64,

    /// Reconnect grace period for the legacy platform, in seconds.
    #[arg(long, env = "STREAMWATCH_LEGACY_RECENT_WINDOW", default_value_t = 1800)]
    pub legacy_recent_window_secs: i64,

    #[arg(long, env = "TWITCH_CLIENT_ID")]
    pub twitch_client_id: Option<String>,

    /// App access token for Helix.
    #[arg(long, env = "TWITCH_TOKEN", hide_env_values = true)]
    pub twitch_token: Option<String>,

    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// e.g. `https://legacy.example`
    #[arg(long, env = "LEGACY_BASE_URL")]
    pub legacy_base_url: Option<String>,

    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: Option<String>,

    /// Comma-separated Discord channel ids to announce in.
    #[arg(long, env = "DISCORD_CHANNEL_IDS", value_delimiter = ',')]
    pub discord_channel_ids: Vec<String>,

    /// Text posted above each Discord embed, e.g. `<@&1234>`.
    #[arg(long, env = "DISCORD_MENTION")]
    pub discord_mention: Option<String>,

    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Poll every configured platform until Ctrl-C (the default).
    Run {
        /// Poll each platform once and exit.
        #[arg(long)]
        once: bool,
    },
    /// Start tracking a channel.
    Add {
        #[arg(long)]
        platform: Platform,
        #[arg(long)]
        service_id: String,
        #[arg(long)]
        member_id: String,
    },
    /// Stop tracking a channel.
    Remove {
        #[arg(long)]
        platform: Platform,
        #[arg(long)]
        service_id: String,
        /// Only remove if this member owns the channel. Omit to remove as an administrator.
        #[arg(long)]
        member_id: Option<String>,
    },
    /// Print tracked channels as JSON lines.
    List {
        #[arg(long)]
        platform: Option<Platform>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("streamwatch=info"));
    let sub = fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(sub).is_ok() {
        // Route `log` records from dependencies through the same subscriber.
        let _ = tracing_log::LogTracer::init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let command = args.command.clone().unwrap_or(Command::Run { once: false });
    info!("streamwatch starting. db={}", args.db_url);

    let result = match command {
        Command::Run { once } => server::run_server(&args, once).await,
        other => commands::handle(&args, other).await,
    };

    if let Err(e) = &result {
        error!("streamwatch failed: {:?}", e);
    }
    result
}
