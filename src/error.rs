//! Error types for the runtime upgrade flow.

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Target runtime belongs to no supported family
    E001UnsupportedRuntimeFamily,
    /// E002: Target runtime family is known but the version string is malformed
    E002InvalidRuntimeFormat,
    /// E003: Credentials missing, expired or lacking permissions
    E003Authorization,
    /// E004: Listing the function inventory failed
    E004QueryFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001UnsupportedRuntimeFamily => "E001",
            Self::E002InvalidRuntimeFormat => "E002",
            Self::E003Authorization => "E003",
            Self::E004QueryFailure => "E004",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::E001UnsupportedRuntimeFamily => {
                "Only python and nodejs runtimes can be upgraded."
            }
            Self::E002InvalidRuntimeFormat => {
                "Use the exact Lambda runtime identifier, e.g. python3.12 or nodejs20.x."
            }
            Self::E003Authorization => {
                "Check --profile/--region and that the credentials allow lambda:ListFunctions."
            }
            Self::E004QueryFailure => "Retry the command; the Lambda API did not answer.",
        }
    }
}

/// Fatal errors: each of these stops the command before any mutation.
#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error(
        "[{code}] Unsupported runtime family '{family}' in '{runtime}' (supported: {supported})\n\n{hint}",
        code = ErrorCode::E001UnsupportedRuntimeFamily.as_str(),
        hint = ErrorCode::E001UnsupportedRuntimeFamily.hint()
    )]
    UnsupportedRuntimeFamily {
        runtime: String,
        family: String,
        supported: String,
    },

    #[error(
        "[{code}] Invalid runtime format '{runtime}', expected something like '{expected}'\n\n{hint}",
        code = ErrorCode::E002InvalidRuntimeFormat.as_str(),
        hint = ErrorCode::E002InvalidRuntimeFormat.hint()
    )]
    InvalidRuntimeFormat { runtime: String, expected: String },

    #[error(
        "[{code}] Not authorized: {message}\n\n{hint}",
        code = ErrorCode::E003Authorization.as_str(),
        hint = ErrorCode::E003Authorization.hint()
    )]
    Authorization { message: String },

    #[error(
        "[{code}] Failed to list {resource}: {message}\n\n{hint}",
        code = ErrorCode::E004QueryFailure.as_str(),
        hint = ErrorCode::E004QueryFailure.hint()
    )]
    QueryFailure {
        resource: &'static str,
        message: String,
    },
}

impl UpgradeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedRuntimeFamily { .. } => ErrorCode::E001UnsupportedRuntimeFamily,
            Self::InvalidRuntimeFormat { .. } => ErrorCode::E002InvalidRuntimeFormat,
            Self::Authorization { .. } => ErrorCode::E003Authorization,
            Self::QueryFailure { .. } => ErrorCode::E004QueryFailure,
        }
    }

    /// Map a failed listing of `resource` ("functions", "layers") onto the
    /// fatal taxonomy.
    pub(crate) fn from_listing(resource: &'static str, err: CloudError) -> Self {
        match err {
            CloudError::Unauthorized(message) => Self::Authorization { message },
            CloudError::NotFound(message) | CloudError::Service(message) => {
                Self::QueryFailure { resource, message }
            }
        }
    }
}

/// Classified failure of a single cloud API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("access denied: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Service(String),
}

/// Result type alias for UpgradeError
pub type Result<T> = std::result::Result<T, UpgradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_code_and_offending_value() {
        let err = UpgradeError::InvalidRuntimeFormat {
            runtime: "python3.x".to_string(),
            expected: "python3.12".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[E002]"));
        assert!(msg.contains("python3.x"));
        assert!(msg.contains("python3.12"));
        assert_eq!(err.code(), ErrorCode::E002InvalidRuntimeFormat);
    }

    #[test]
    fn listing_errors_are_classified() {
        let denied =
            UpgradeError::from_listing("functions", CloudError::Unauthorized("nope".into()));
        assert_eq!(denied.code(), ErrorCode::E003Authorization);

        let broken =
            UpgradeError::from_listing("functions", CloudError::Service("throttled".into()));
        assert_eq!(broken.code(), ErrorCode::E004QueryFailure);
        assert!(broken.to_string().contains("Failed to list functions: throttled"));

        let layers = UpgradeError::from_listing("layers", CloudError::Service("throttled".into()));
        assert!(layers.to_string().starts_with("[E004] Failed to list layers: throttled"));
    }
}
