//! Account, region, and partition identifiers.

use std::fmt;
use std::str::FromStr;

use crate::RustStackError;

/// Accessors, `Default`, and `Display` shared by the identifier newtypes.
macro_rules! identifier {
    ($ty:ident, $default:literal) => {
        impl $ty {
            /// Value used when none is configured.
            pub const DEFAULT: &str = $default;

            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self(Self::DEFAULT.to_owned())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// 12-digit AWS account ID. Deserializing validates the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

identifier!(AccountId, "000000000000");

impl AccountId {
    /// Parse an account ID.
    ///
    /// # Errors
    /// Returns an error if `id` is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, RustStackError> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(Self(id))
        } else {
            Err(RustStackError::InvalidAccountId(id))
        }
    }

    /// Whether `id` is a well-formed account ID.
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        id.len() == 12 && id.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for AccountId {
    type Err = RustStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = RustStackError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// AWS region, e.g. `eu-west-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AwsRegion(String);

identifier!(AwsRegion, "us-east-1");

impl AwsRegion {
    /// Wrap a region name.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }
}

/// AWS partition: `aws`, `aws-cn`, `aws-us-gov`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Partition(String);

identifier!(Partition, "aws");

impl Partition {
    /// Wrap a partition name.
    #[must_use]
    pub fn new(partition: impl Into<String>) -> Self {
        Self(partition.into())
    }
}
