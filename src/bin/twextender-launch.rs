//! Runs the journal processor with its fixed arguments from this
//! executable's directory and exits with the processor's status.

use twextender::config::Config;
use twextender::launcher::{self, LaunchPlan};

fn main() {
    let config = Config::load_quiet();
    let plan = LaunchPlan::from_config(&config.launch);

    let result = launcher::launcher_dir().and_then(|dir| launcher::run(&plan, &dir));
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}
