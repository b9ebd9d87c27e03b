mod args;
mod radar;

use clap::Parser;
use log::{debug, warn};

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    if let Err(e) = radar::run(&args) {
        warn!("Error occurred {:?}", e);
        eprintln!("{}", radar::error_report(&e));
        std::process::exit(1);
    }
}
