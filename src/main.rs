mod args;
mod commands;

use args::{args, Arguments, ArgumentsParser};
use krbcc::core::Config;
use krbcc::Result;
use log::error;

fn init_log(verbosity: usize) {
    stderrlog::new()
        .module(module_path!())
        .module("krbcc")
        .verbosity(verbosity)
        .init()
        .unwrap();
}

fn main() {
    let args = ArgumentsParser::parse(&args().get_matches());

    if let Err(error) = main_inner(args) {
        error!("{}", error);
        std::process::exit(1);
    }
}

fn main_inner(args: Arguments) -> Result<()> {
    let config = Config::from_env();

    match args {
        Arguments::Init(args) => init(args, config),
        Arguments::List(args) => list(args, config),
    }
}

fn init(args: args::init::Arguments, config: Config) -> Result<()> {
    init_log(args.verbosity);
    return commands::init(args.principal, args.out_file, &config);
}

fn list(args: args::list::Arguments, config: Config) -> Result<()> {
    init_log(args.verbosity);
    let config = config.initiate_credential(args.policy);
    return commands::list(
        args.in_file,
        args.only_tgts,
        args.srealm,
        args.show_config,
        args.show_initial,
        &config,
    );
}
