use clap::{CommandFactory, FromArgMatches, Parser};

use crate::ServiceDefinition;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// what to do, `serve` when omitted
    #[command(subcommand)]
    pub command: Option<crate::Command>,
}

impl Args {
    /// Parse the process arguments, naming the command after the service.
    pub fn parse_for(definition: ServiceDefinition) -> Self {
        match Self::try_parse_for(definition, std::env::args_os()) {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn try_parse_for<I, T>(definition: ServiceDefinition, argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command()
            .name(definition.name)
            .about(format!("The {} service", definition.name))
            .try_get_matches_from(argv)?;
        Self::from_arg_matches(&matches)
    }
}
