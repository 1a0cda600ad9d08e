//! Shared entry point for the service binaries.
//!
//! Each binary only names its [`ServiceDefinition`] and hands over to
//! [`main_for`]:
//!
//! ```text
//! shipping            # serve (the default)
//! shipping serve
//! shipping version [--json]
//! ```

mod args;
pub mod op;
pub mod ops;
mod process;

pub use op::{Op, OpContext};
pub use ops::{Serve, Version};
pub use process::main_for;

service_commands! {
    Serve => Serve,
    Version => Version,
}

/// The bits that differ between one microservice binary and the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: &'static str,
    /// used unless `APP_PORT` says otherwise
    pub default_port: u16,
}

pub const BILLING: ServiceDefinition = ServiceDefinition {
    name: "billing",
    default_port: 8001,
};

pub const ORDER: ServiceDefinition = ServiceDefinition {
    name: "order",
    default_port: 8002,
};

pub const SHIPPING: ServiceDefinition = ServiceDefinition {
    name: "shipping",
    default_port: 8003,
};

pub const USER: ServiceDefinition = ServiceDefinition {
    name: "user",
    default_port: 8004,
};
