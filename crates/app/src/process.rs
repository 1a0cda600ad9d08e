use common::version::build_info;

use crate::args::Args;
use crate::op::OpContext;
use crate::{Command, Serve, ServiceDefinition};

/// Parse arguments, run the requested op and exit the process.
///
/// Any error is printed to stderr and exits with status 1.
pub async fn main_for(definition: ServiceDefinition) {
    let args = Args::parse_for(definition);
    let ctx = OpContext::new(definition);
    let command = args.command.unwrap_or(Command::Serve(Serve));

    match command.run(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn register_panic_logger() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "service panicked");
        default_hook(info);
    }));
}

pub fn report_build_info() {
    let info = build_info();
    tracing::debug!(
        package_version = %info.package_version,
        git_hash = %info.git_hash,
        profile = %info.build_profile,
        features = %info.build_features,
        built_at = %info.build_timestamp,
        rustc = %info.rust_version,
        target = %info.target,
        "build info"
    );
}
