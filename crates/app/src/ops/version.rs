use clap::Args;

use common::version::{build_info, version};

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// print the full build info as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("failed to serialize build info: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let info = build_info();
        if self.json {
            return Ok(serde_json::to_string_pretty(&info)?);
        }
        Ok(format!("{} {}\n{}", ctx.service.name, version(), info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Op, OpContext};
    use crate::ORDER;

    #[tokio::test]
    async fn test_plain_output() {
        let output = Version { json: false }
            .execute(&OpContext::new(ORDER))
            .await
            .unwrap();

        let first_line = output.lines().next().unwrap_or_default();
        assert_eq!(first_line, format!("order {}", version()));
    }

    #[tokio::test]
    async fn test_json_output() {
        let output = Version { json: true }
            .execute(&OpContext::new(ORDER))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["package_version"], env!("CARGO_PKG_VERSION"));
        assert!(parsed["git_hash"].is_string());
    }
}
