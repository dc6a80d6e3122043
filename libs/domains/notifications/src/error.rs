//! Error types for the notification dispatcher.

use crate::enrichment::UpstreamFetchError;
use crate::envelope::BuilderPreconditionError;
use crate::publisher::PublishError;
use crate::templates::TemplateResolutionError;
use crate::validation::ValidationError;
use core_config::ConfigError;
use nats_worker::ErrorCategory;
use thiserror::Error;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Everything that can end a handler invocation early.
///
/// Variants hold the originating error unchanged; only the category decides
/// what the broker does with the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    TemplateResolution(#[from] TemplateResolutionError),

    #[error(transparent)]
    UpstreamFetch(#[from] UpstreamFetchError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Builder(#[from] BuilderPreconditionError),

    #[error("payload could not be decoded: {0}")]
    Deserialization(String),

    #[error("no handler for subject '{0}'")]
    UnknownSubject(String),
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DispatchError::Validation(_)
            | DispatchError::TemplateResolution(_)
            | DispatchError::Builder(_)
            | DispatchError::Deserialization(_)
            | DispatchError::UnknownSubject(_) => ErrorCategory::Permanent,
            DispatchError::UpstreamFetch(_)
            | DispatchError::Publish(_)
            | DispatchError::Configuration(_) => ErrorCategory::Transient,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::TemplateResolution(_) => "template_resolution",
            DispatchError::UpstreamFetch(_) => "upstream_fetch",
            DispatchError::Configuration(_) => "configuration",
            DispatchError::Publish(_) => "publish",
            DispatchError::Builder(_) => "builder",
            DispatchError::Deserialization(_) => "deserialization",
            DispatchError::UnknownSubject(_) => "unknown_subject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let permanent = [
            DispatchError::from(ValidationError::MissingValue { field: "url" }),
            DispatchError::from(TemplateResolutionError {
                discriminant: "ContractChangeType",
                value: "X".to_string(),
            }),
            DispatchError::from(BuilderPreconditionError::NoRecipients),
            DispatchError::Deserialization("eof".to_string()),
            DispatchError::UnknownSubject("x.y".to_string()),
        ];
        for err in permanent {
            assert_eq!(err.category(), ErrorCategory::Permanent, "{err}");
        }

        let transient = [
            DispatchError::from(UpstreamFetchError::Status {
                url: "http://x".to_string(),
                status: 502,
            }),
            DispatchError::from(PublishError {
                subject: "notifications.email".to_string(),
                message: "timeout".to_string(),
            }),
            DispatchError::from(ConfigError::MissingEnvVar("CONTRACTS_PORTAL_URL".to_string())),
        ];
        for err in transient {
            assert_eq!(err.category(), ErrorCategory::Transient, "{err}");
        }
    }

    #[test]
    fn test_wrapped_errors_are_unchanged() {
        let original = ValidationError::InvalidStructure {
            field: "id",
            reason: "must not be 0".to_string(),
        };
        let err = DispatchError::from(original.clone());

        assert_eq!(err.to_string(), original.to_string());
        assert_eq!(err, DispatchError::Validation(original));
        assert_eq!(err.kind(), "validation");
    }
}
