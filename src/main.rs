// src/main.rs

use std::io::Write;

use rfile::{cli, error_report, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level, args.verbose) {
        eprintln!("rfile: failed to initialise logging: {err:?}");
    }

    // Ctrl-C ends everything at once; children share our process group and
    // get the interrupt themselves.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let result = run(args).await;
    let _ = std::io::stdout().flush();
    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}", error_report(&err));
            std::process::exit(1);
        }
    }
}
