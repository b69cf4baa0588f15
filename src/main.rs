// src/main.rs

use proc_interact::errors::ProcessError;
use proc_interact::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("proc-interact error: {err:?}");
        let code = err
            .downcast_ref::<ProcessError>()
            .and_then(ProcessError::exit_code)
            .filter(|code| *code != 0)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
