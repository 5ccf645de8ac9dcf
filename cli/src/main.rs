mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, container, wait};
use netwait_common::config::Config;
use netwait_common::error;
use terminal::{logging, print, workflow};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.quiet);

    let cfg = Config {
        quiet: commands.quiet,
    };

    let result: anyhow::Result<()> = match commands.command {
        Commands::Wait(args) => {
            print::header("waiting for service", cfg.quiet);
            wait::wait(args, &cfg).await
        }
        Commands::Ci(args) => {
            print::header("starting ci", cfg.quiet);
            container::ci(args, &cfg).await
        }
        Commands::Privileged(args) => {
            print::header("starting privileged container", cfg.quiet);
            container::privileged(args, &cfg).await
        }
    };

    print::end_of_program(cfg.quiet);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message: String = format!("{err:#}");
            error!("{message}");
            workflow::set_failed(&message);
            ExitCode::FAILURE
        }
    }
}
