use std::error::Error;
use std::fmt::Display;

use crate::ServiceDefinition;

#[derive(Debug, Clone)]
pub struct OpContext {
    /// the service this binary runs
    pub service: ServiceDefinition,
}

impl OpContext {
    pub fn new(service: ServiceDefinition) -> Self {
        Self { service }
    }
}

/// One thing a service binary can be asked to do.
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    /// printed to stdout once the op finishes
    type Output: Display;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Declares the `Command` subcommand enum over a list of [`Op`]s, and a
/// `CommandError` wrapping each op's error.
///
/// `Command::run` executes the selected op and renders its output.
#[macro_export]
macro_rules! service_commands {
    ($($variant:ident => $op:ty),+ $(,)?) => {
        #[derive(clap::Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($op),)+
        }

        #[derive(Debug, thiserror::Error)]
        pub enum CommandError {
            $(
                #[error(transparent)]
                $variant(<$op as $crate::op::Op>::Error),
            )+
        }

        impl Command {
            pub async fn run(&self, ctx: &$crate::op::OpContext) -> Result<String, CommandError> {
                use $crate::op::Op as _;

                match self {
                    $(Command::$variant(op) => match op.execute(ctx).await {
                        Ok(output) => Ok(output.to_string()),
                        Err(e) => Err(CommandError::$variant(e)),
                    },)+
                }
            }
        }
    };
}
