use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::cmds::Opt;

mod cmds;
mod commands;
mod lister;
mod publisher;

fn init_tracing(debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries published messages
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let opt = Opt::parse();
    init_tracing(opt.debug, opt.log_json);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "Failed to load .env file");
        }
    }

    match commands::invoke(opt) {
        Ok(output) => {
            if let Some(output) = output {
                println!("{output}");
            }
        }
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };
}
