//! Compiler configuration.
//!
//! Provides [`CompilerConfig`], the account context every generated ARN is
//! built from. Values are loaded from environment variables, matching
//! LocalStack conventions where one exists.

use rustack_core::{AccountId, Arn, AwsRegion, Partition, RustStackError, RustStackResult};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default prefix of the derived dashboard name.
pub const DEFAULT_DASHBOARD_PREFIX: &str = "eventbridge";

/// Compiler configuration.
///
/// # Examples
///
/// ```
/// use rustack_events_core::config::CompilerConfig;
///
/// let config = CompilerConfig::default();
/// assert_eq!(config.region.as_str(), "us-east-1");
/// assert_eq!(config.dashboard_prefix, "eventbridge");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Region the resources are compiled for.
    #[builder(default)]
    pub region: AwsRegion,

    /// Account owning the compiled resources.
    #[builder(default)]
    pub account_id: AccountId,

    /// Partition used in generated ARNs.
    #[builder(default)]
    pub partition: Partition,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Prefix of the derived dashboard name.
    #[builder(default = String::from(DEFAULT_DASHBOARD_PREFIX))]
    pub dashboard_prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            region: AwsRegion::default(),
            account_id: AccountId::default(),
            partition: Partition::default(),
            log_level: String::from("info"),
            dashboard_prefix: String::from(DEFAULT_DASHBOARD_PREFIX),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DEFAULT_REGION` | `us-east-1` |
    /// | `ACCOUNT_ID` | `000000000000` |
    /// | `PARTITION` | `aws` |
    /// | `LOG_LEVEL` | `info` |
    /// | `DASHBOARD_PREFIX` | `eventbridge` |
    ///
    /// # Errors
    ///
    /// Returns an error if `ACCOUNT_ID` is not a 12-digit account ID or
    /// `DASHBOARD_PREFIX` is empty.
    pub fn from_env() -> RustStackResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DEFAULT_REGION") {
            config.region = AwsRegion::new(v);
        }
        if let Ok(v) = std::env::var("ACCOUNT_ID") {
            config.account_id = AccountId::new(v)?;
        }
        if let Ok(v) = std::env::var("PARTITION") {
            config.partition = Partition::new(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("DASHBOARD_PREFIX") {
            if v.is_empty() {
                return Err(RustStackError::Config(
                    "DASHBOARD_PREFIX must not be empty".to_owned(),
                ));
            }
            config.dashboard_prefix = v;
        }

        Ok(config)
    }

    /// ARN of a resource of `service` owned by the configured account.
    #[must_use]
    pub fn arn(&self, service: &str, resource: impl Into<String>) -> Arn {
        Arn::new(
            &self.partition,
            service,
            &self.region,
            &self.account_id,
            resource,
        )
    }

    /// Whether `arn` belongs to the configured account and region.
    #[must_use]
    pub fn owns(&self, arn: &Arn) -> bool {
        arn.partition() == self.partition.as_str()
            && arn.region() == self.region.as_str()
            && arn.account() == self.account_id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.region.as_str(), "us-east-1");
        assert_eq!(config.account_id.as_str(), "000000000000");
        assert_eq!(config.partition.as_str(), "aws");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.dashboard_prefix, "eventbridge");
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = CompilerConfig::builder()
            .region(AwsRegion::new("eu-west-1"))
            .account_id(AccountId::new("123456789012").unwrap())
            .dashboard_prefix("ops".into())
            .build();

        assert_eq!(config.region.as_str(), "eu-west-1");
        assert_eq!(config.account_id.as_str(), "123456789012");
        assert_eq!(config.partition.as_str(), "aws");
        assert_eq!(config.dashboard_prefix, "ops");
    }

    #[test]
    fn test_should_build_owned_arns() {
        let config = CompilerConfig::default();
        let arn = config.arn("events", "event-bus/orders");
        assert_eq!(
            arn.to_string(),
            "arn:aws:events:us-east-1:000000000000:event-bus/orders"
        );
        assert!(config.owns(&arn));

        let foreign: Arn = "arn:aws:events:us-east-1:123456789012:event-bus/orders"
            .parse()
            .unwrap();
        assert!(!config.owns(&foreign));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&CompilerConfig::default()).expect("test serialization");
        assert!(json.contains("accountId"));
        assert!(json.contains("dashboardPrefix"));
    }
}
