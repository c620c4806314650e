use clap::{CommandFactory, Parser};

use twextender::app;
use twextender::cli::Cli;
use twextender::config::Config;
use twextender::error::AppError;

fn main() {
    let cli = Cli::parse();

    // Load config file (quietly if --quiet was passed)
    let config = if cli.quiet {
        Config::load_quiet()
    } else {
        Config::load()
    };
    let cli = cli.with_config(&config);

    if let Err(e) = app::run(cli, &config) {
        match e {
            AppError::Usage(_) | AppError::InvalidDate { .. } => {
                eprintln!("{e}\n");
                eprintln!("{}", Cli::command().render_help());
            }
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(e.exit_code());
    }
}
