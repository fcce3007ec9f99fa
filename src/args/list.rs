use super::validators;
use clap::{App, Arg, ArgMatches, SubCommand};

pub const COMMAND_NAME: &str = "list";

pub fn command() -> App<'static, 'static> {
    SubCommand::with_name(COMMAND_NAME)
        .about("Describe the credentials stored in a cache file")
        .arg(
            Arg::with_name("in-file")
                .takes_value(true)
                .help("Cache file to be described. Detected from KRB5CCNAME or the user default cache if not provided"),
        )
        .arg(
            Arg::with_name("tgt")
                .long("tgt")
                .short("t")
                .help("Only show TGTs"),
        )
        .arg(
            Arg::with_name("srealm")
                .long("srealm")
                .takes_value(true)
                .help("Only show tickets for services of the given realm"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .help("Shows the config entries"),
        )
        .arg(
            Arg::with_name("initial")
                .long("initial")
                .short("i")
                .help("Shows the credential used to initiate a security context"),
        )
        .arg(
            Arg::with_name("policy")
                .long("policy")
                .takes_value(true)
                .possible_values(&[
                    "no-impersonate",
                    "try-impersonate",
                    "always-impersonate",
                ])
                .validator(validators::is_policy)
                .help("Impersonation policy. Detected from KRB5_DEFAULT_INITIATE_CREDENTIAL if not provided"),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
}

pub struct Arguments {
    pub in_file: Option<String>,
    pub only_tgts: bool,
    pub srealm: Option<String>,
    pub show_config: bool,
    pub show_initial: bool,
    pub policy: Option<String>,
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
            in_file: self.matches.value_of("in-file").map(|s| s.into()),
            only_tgts: self.matches.is_present("tgt"),
            srealm: self.matches.value_of("srealm").map(|s| s.into()),
            show_config: self.matches.is_present("config"),
            show_initial: self.matches.is_present("initial"),
            policy: self.matches.value_of("policy").map(|s| s.into()),
            verbosity: self.matches.occurrences_of("verbosity") as usize,
        };
    }
}
