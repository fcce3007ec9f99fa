use super::validators;
use clap::{App, Arg, ArgMatches, SubCommand};
use krbcc::core::Principal;

pub const COMMAND_NAME: &str = "init";

pub fn command() -> App<'static, 'static> {
    SubCommand::with_name(COMMAND_NAME)
        .about("Creates an empty cache file for a principal")
        .arg(
            Arg::with_name("principal")
                .takes_value(true)
                .required(true)
                .validator(validators::is_principal)
                .help("Owner of the cache, in the form name@REALM"),
        )
        .arg(
            Arg::with_name("out-file")
                .takes_value(true)
                .help("Cache file to create. Detected from KRB5CCNAME or the user default cache if not provided"),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
}

pub struct Arguments {
    pub principal: Principal,
    pub out_file: Option<String>,
    pub verbosity: usize,
}

pub struct ArgumentsParser<'a> {
    matches: &'a ArgMatches<'a>,
}

impl<'a> ArgumentsParser<'a> {
    pub fn parse(matches: &'a ArgMatches) -> Arguments {
        let parser = Self { matches: matches };
        return parser._parse();
    }

    fn _parse(&self) -> Arguments {
        return Arguments {
            principal: self
                .matches
                .value_of("principal")
                .unwrap()
                .parse()
                .unwrap(),
            out_file: self.matches.value_of("out-file").map(|s| s.into()),
            verbosity: self.matches.occurrences_of("verbosity") as usize,
        };
    }
}
