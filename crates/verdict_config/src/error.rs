//! Errors raised while reading `verdict.toml`.

/// Why a `verdict.toml` could not be turned into builder settings.
///
/// A missing file is not an error; [`load_config`](crate::load_config)
/// falls back to the defaults.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read verdict.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the settings schema,
    /// e.g. an unknown `cycle_policy`.
    #[error("malformed verdict.toml: {0}")]
    ParseError(String),

    /// A setting parsed but is unusable, such as a zero `batch_size`.
    #[error("invalid build setting: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file() {
        let io = ConfigError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(io.to_string(), "cannot read verdict.toml: denied");

        let parse = ConfigError::ParseError("unknown variant `strict`".to_string());
        assert_eq!(
            parse.to_string(),
            "malformed verdict.toml: unknown variant `strict`"
        );
    }

    #[test]
    fn validation_message_names_the_setting() {
        let err = ConfigError::ValidationError("build.batch_size must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "invalid build setting: build.batch_size must be positive"
        );
    }
}
