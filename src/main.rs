use felonyfit::config::{load_config, load_config_from, schema_json};
use felonyfit::startup::run;
use felonyfit::utils::logger::init_logging;

fn usage() -> ! {
    eprintln!("usage: felonyfit [--config <path>] [--schema]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => {
                println!("{}", schema_json());
                return;
            }
            "--config" => match args.next() {
                Some(path) => config_path = Some(path),
                None => usage(),
            },
            _ => usage(),
        }
    }

    let config = match config_path {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        tracing::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
