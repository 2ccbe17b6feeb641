use propwatch::PropwatchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("propwatch error: {0}")]
    Observe(#[from] PropwatchError),

    #[error("removing {key} failed: {source}")]
    Remove {
        key: String,
        #[source]
        source: PropwatchError,
    },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },

    #[error("{failures} event(s) could not be written to the output")]
    EventOutput { failures: usize },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::Observe(_) | Self::Remove { .. } => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propwatch::{Key, KeyPath};

    #[test]
    fn exit_codes_separate_usage_from_observe_failures() {
        assert_eq!(DemoError::invalid("bad").exit_code(), 2);
        let cycle = PropwatchError::CycleDetected {
            path: KeyPath::root().child(Key::Index(0)),
        };
        assert_eq!(DemoError::from(cycle).exit_code(), 3);
        assert_eq!(DemoError::EventOutput { failures: 1 }.exit_code(), 1);
    }

    #[test]
    fn library_errors_keep_their_message() {
        let error = DemoError::from(PropwatchError::NotAContainer);
        assert_eq!(
            error.to_string(),
            "propwatch error: value is a primitive, not a list or map"
        );
    }

    #[test]
    fn removal_errors_name_the_step_and_key() {
        let key = Key::from("nope");
        let bare = key.bare().to_string();
        let error = DemoError::Remove {
            key: bare,
            source: PropwatchError::KeyNotFound { key },
        };
        assert_eq!(
            error.to_string(),
            "removing \"nope\" failed: key not found: \"nope\""
        );
        assert_eq!(error.exit_code(), 3);
    }
}
