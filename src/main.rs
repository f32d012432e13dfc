use clap::Parser;
use dir2gh::cli;
use log::{error, info};

fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .format_timestamp(None)
        .init();

    info!("Starting dir2gh v{}", env!("CARGO_PKG_VERSION"));

    let code = match cli::run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(code);
}
