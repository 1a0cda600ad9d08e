//! The wrapper every microservice in this workspace runs inside.
//!
//! A [`Service`] carries a name, port, version, environment tag and a
//! [`Logger`](common::logger::Logger), and serves four fixed endpoints:
//!
//! | Path        | Body                      |
//! |-------------|---------------------------|
//! | `/`         | `<name> service`          |
//! | `/_ready`   | `<name> service is ready` |
//! | `/_live`    | `<name> service is alive` |
//! | `/_version` | `<version>`               |

pub mod http_server;
mod service;
mod state;

pub use service::{Service, ServiceBuilder, ServiceError, DEFAULT_LOG_LEVEL, DEFAULT_PORT};
pub use state::State as ServiceState;
