use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use common::config::Config;
use common::logger::{LogLevel, Logger, LoggerError};

use crate::http_server::{self, HttpServerError};
use crate::ServiceState;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug)]
pub struct Service {
    name: String,
    port: u16,
    version: String,
    environment: String,
    logger: Logger,
    // kept so a level change rebuilds the logger onto the same sink
    log_sink: Option<LogSink>,
}

impl Service {
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Always the threshold of [`Service::logger`].
    pub fn log_level(&self) -> LogLevel {
        self.logger.level()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Swap in a logger at `level`.
    ///
    /// An unknown level is rejected and the current logger stays in place.
    pub fn set_log_level(&mut self, level: &str) -> Result<(), ServiceError> {
        self.logger = build_logger(level, self.log_sink.as_ref())?;
        Ok(())
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::new(&self.name, &self.version)
    }

    /// The service's endpoints, with request handling logged through [`Service::logger`].
    pub fn router(&self) -> axum::Router {
        let config = http_server::Config::new(self.port);
        http_server::with_dispatch(
            http_server::router(self.state(), config.trace_level),
            self.logger.dispatch().clone(),
        )
    }

    /// Serve on `0.0.0.0:<port>` until the listener fails.
    pub async fn run(self) -> Result<(), ServiceError> {
        self.log_startup();

        let config = http_server::Config::new(self.port);
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| ServiceError::Bind {
                port: self.port,
                source,
            })?;

        self.serve_on(listener, std::future::pending()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.log_startup();
        self.serve_on(listener, shutdown).await
    }

    async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        http_server::run(listener, router, shutdown)
            .with_subscriber(self.logger.dispatch().clone())
            .await?;
        Ok(())
    }

    /// The threshold goes under `log_level` since `level` is the record's own severity.
    fn log_startup(&self) {
        self.logger.in_scope(|| {
            tracing::info!(
                service = %self.name,
                port = self.port,
                version = %self.version,
                environment = %self.environment,
                log_level = %self.log_level(),
                "starting"
            );
        });
    }
}

/// Hands out a fresh writer factory each time the logger is rebuilt.
#[derive(Clone)]
struct LogSink(Arc<dyn Fn() -> BoxMakeWriter + Send + Sync>);

impl LogSink {
    fn new<W>(make_writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
    {
        Self(Arc::new(move || BoxMakeWriter::new(make_writer.clone())))
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

fn build_logger(level: &str, sink: Option<&LogSink>) -> Result<Logger, LoggerError> {
    match sink {
        Some(sink) => Logger::with_writer(level, (sink.0)()),
        None => Logger::new(level),
    }
}

/// Collects service settings; the logger is built once, at the final level.
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    name: String,
    port: u16,
    version: String,
    environment: String,
    log_level: String,
    log_sink: Option<LogSink>,
}

impl ServiceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: DEFAULT_PORT,
            version: String::new(),
            environment: String::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_sink: None,
        }
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Send log records to `make_writer` rather than standard output,
    /// e.g. `std::io::stderr` or a shared file handle.
    pub fn log_writer<W>(mut self, make_writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
    {
        self.log_sink = Some(LogSink::new(make_writer));
        self
    }

    /// Take environment, port and log level from a loaded [`Config`].
    pub fn config(self, config: &Config) -> Self {
        self.environment(config.environment.clone())
            .port(config.port)
            .log_level(config.log_level.clone())
    }

    pub fn build(self) -> Result<Service, ServiceError> {
        let logger = build_logger(&self.log_level, self.log_sink.as_ref())?;

        Ok(Service {
            name: self.name,
            port: self.port,
            version: self.version,
            environment: self.environment,
            logger,
            log_sink: self.log_sink,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("error initializing logger: {0}")]
    Logger(#[from] LoggerError),
    #[error("failed to listen on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error(transparent)]
    Serve(#[from] HttpServerError),
}
