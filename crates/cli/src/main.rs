// extraterm-launcher entry point.

use std::process;

use extraterm_launcher::exit_code::ExitCode;
use extraterm_launcher::output::{self, OutputFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().collect();
    match extraterm_launcher::run(&argv).await {
        Ok(code) => code.into(),
        Err(err) => {
            output::print_anyhow_error(OutputFormat::detect(), &err);
            ExitCode::from_error(&err).into()
        }
    }
}
