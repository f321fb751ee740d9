//! Structured resource identifiers.
//!
//! An ARN is a colon-delimited string with a fixed positional schema:
//!
//! ```text
//! arn:partition:service:region:account:resource
//! ```
//!
//! The resource segment is free-form and may itself contain `:` or `/`
//! (`function:my-fn:prod`, `event-bus/orders`). Parsing fails closed: a
//! missing segment is an error rather than a best guess.

use std::fmt;
use std::str::FromStr;

use crate::error::RustStackError;
use crate::types::{AccountId, AwsRegion, Partition};

/// The only accepted scheme segment.
const SCHEME: &str = "arn";

/// Number of positional segments in an ARN.
const SEGMENTS: usize = 6;

/// A parsed Amazon Resource Name.
///
/// # Examples
///
/// ```
/// use rustack_core::Arn;
///
/// let arn: Arn = "arn:aws:sqs:us-east-1:123456789012:orders-dlq".parse().unwrap();
/// assert_eq!(arn.service(), "sqs");
/// assert_eq!(arn.resource_id(), "orders-dlq");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arn {
    partition: String,
    service: String,
    region: String,
    account: String,
    resource: String,
}

impl Arn {
    /// Build an ARN for a resource owned by `account` in `region`.
    #[must_use]
    pub fn new(
        partition: &Partition,
        service: impl Into<String>,
        region: &AwsRegion,
        account: &AccountId,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.as_str().to_owned(),
            service: service.into(),
            region: region.as_str().to_owned(),
            account: account.as_str().to_owned(),
            resource: resource.into(),
        }
    }

    /// Partition segment (`aws`, `aws-cn`, ...).
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Service segment (`sqs`, `lambda`, `events`, ...).
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region segment. Empty for global resources.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Account segment. Empty for some global resources (S3 buckets).
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The whole resource path.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Resource type prefix, when the path is `type/id` or `type:id`.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.split_resource().map(|(ty, _)| ty)
    }

    /// Resource name segment: the part after the type prefix, or the whole
    /// path when there is no prefix (SQS queues, SNS topics).
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.split_resource().map_or(&self.resource, |(_, id)| id)
    }

    /// Whether this ARN names a resource of `service`, optionally with the
    /// given resource type.
    #[must_use]
    pub fn is(&self, service: &str, resource_type: Option<&str>) -> bool {
        self.service == service && resource_type.is_none_or(|ty| self.resource_type() == Some(ty))
    }

    fn split_resource(&self) -> Option<(&str, &str)> {
        let idx = self.resource.find(['/', ':'])?;
        let (ty, rest) = self.resource.split_at(idx);
        Some((ty, &rest[1..]))
    }
}

impl FromStr for Arn {
    type Err = RustStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RustStackError::InvalidArn {
            arn: s.to_owned(),
            reason: reason.to_owned(),
        };

        let parts: Vec<&str> = s.splitn(SEGMENTS, ':').collect();
        if parts.len() != SEGMENTS {
            return Err(invalid(&format!(
                "expected {SEGMENTS} colon-delimited segments, found {}",
                parts.len()
            )));
        }
        if parts[0] != SCHEME {
            return Err(invalid("must start with 'arn:'"));
        }
        if parts[1].is_empty() {
            return Err(invalid("missing partition segment"));
        }
        if parts[2].is_empty() {
            return Err(invalid("missing service segment"));
        }
        if !parts[4].is_empty() && !AccountId::is_valid(parts[4]) {
            return Err(invalid("account segment must be a 12-digit account ID"));
        }
        if parts[5].is_empty() {
            return Err(invalid("missing resource segment"));
        }

        Ok(Self {
            partition: parts[1].to_owned(),
            service: parts[2].to_owned(),
            region: parts[3].to_owned(),
            account: parts[4].to_owned(),
            resource: parts[5].to_owned(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

impl serde::Serialize for Arn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Arn {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
