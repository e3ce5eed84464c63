mod cli;

use clap::Parser;

use cli::{Args, Command};
use screenrec::config::Config;
use screenrec::error::RecorderError;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(args: Args) -> Result<(), RecorderError> {
    let cfg = Config::load(args.config.as_deref())?;

    match args.command {
        Some(Command::ListDevices) => cli::list_devices(&cfg),
        Some(Command::ListModes { device }) => cli::list_modes(device, &cfg),
        Some(Command::Check) => cli::check(&cfg),
        Some(Command::Config { action }) => cli::handle_config_action(action, &cfg),
        None => cli::record(&args.record, &cfg),
    }
}

fn main() {
    init_logging();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
