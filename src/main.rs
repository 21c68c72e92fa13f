//! Release Pack - packages an application into an image, a Helm chart and
//! offline release archives.

use std::process;

#[tokio::main]
async fn main() {
    let args = release_pack::cli::Args::parse_args();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_filter()),
    )
    .init();

    // Run CLI and get exit code
    let exit_code = match release_pack::cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = std::error::Error::source(cause);
            }
            1
        }
    };

    process::exit(exit_code);
}
