//! Resynth CLI - renders and inspects partial sets

use clap::Parser;
use std::process::ExitCode;

use resynth_cli::cli_args::{Cli, Commands};
use resynth_cli::commands;
use resynth_cli::commands::render::RenderOptions;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            input,
            output,
            block_size,
            sample_rate,
            fade_time,
            seed,
            transpose,
            normalize,
        } => commands::render::run(
            &input,
            &output,
            &RenderOptions {
                block_size,
                sample_rate,
                fade_time,
                seed,
                transpose,
                normalize,
            },
        ),
        Commands::Inspect { input, json } => commands::inspect::run(&input, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
