use clap::Args;

use common::config::{Config, ConfigError, Env, ProcessEnv};
use common::logger::LoggerError;
use service::{Service, ServiceError};

use crate::ServiceDefinition;

#[derive(Args, Debug, Clone)]
pub struct Serve;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logger error: {0}")]
    Logger(#[from] LoggerError),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Resolve configuration from `env` and build the service it describes.
pub fn build_service<E>(definition: ServiceDefinition, env: E) -> Result<Service, ServeError>
where
    E: Env + 'static,
{
    let config = Config::builder()
        .with_env(env)
        .with_default_port(definition.default_port)
        .build()?;

    let service = Service::builder(definition.name)
        .config(&config)
        .version(common::version::version())
        .build()?;

    Ok(service)
}

#[async_trait::async_trait]
impl crate::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // a missing .env is fine, a malformed one is not
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        let service = build_service(ctx.service, ProcessEnv)?;
        service.logger().install_global()?;

        crate::process::register_panic_logger();
        crate::process::report_build_info();

        service.run().await?;
        Ok(format!("{} service ended", ctx.service.name))
    }
}
