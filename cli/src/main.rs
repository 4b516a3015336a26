mod commands;
mod export;
mod input;
mod terminal;

use commands::{CommandLine, Commands, check, fuse};
use nfusion_common::config::Config;
use terminal::{logging, print};

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose, commands.quiet);

    let cfg = Config {
        no_banner: commands.no_banner,
        quiet: commands.quiet,
        parallel: !commands.sequential,
    };

    print::banner(cfg.no_banner, cfg.quiet);

    let result = match commands.command {
        Commands::Fuse(args) => {
            print::header("fusing scan results", cfg.quiet);
            fuse::fuse(args, &cfg)
        }
        Commands::CheckPolicy { policy } => {
            print::header("checking risk policy", cfg.quiet);
            check::check_policy(&policy, &cfg)
        }
    };

    print::end_of_program(cfg.quiet);
    result
}
