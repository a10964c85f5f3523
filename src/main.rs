use clap::Parser;
use council::core::config::{self, CliOverrides, EnvOverrides};
use council::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "council", about = "Terminal client for the LLM council")]
struct Args {
    /// Council backend URL (overrides config and COUNCIL_BASE_URL)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Continue an existing conversation instead of starting a new one
    #[arg(short, long)]
    conversation: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to council.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("council.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Ignoring config file: {}", e);
            eprintln!("warning: {e}; using defaults");
            config::CouncilConfig::default()
        }
    };
    let cli = CliOverrides {
        base_url: args.base_url,
        conversation_id: args.conversation,
    };
    let resolved = config::resolve(&file_config, &EnvOverrides::from_env(), &cli);

    log::info!("Council starting up against {}", resolved.base_url);

    tui::run(resolved)
}
