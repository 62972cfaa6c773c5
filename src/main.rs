// src/main.rs

use sitepipe::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("sitepipe: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        // The subscriber is up by now; report through it.
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}
