//! Configuration file loader with position-aware error reporting.
//!
//! An explicit `--config` path must exist. The default XDG location may be
//! absent, in which case `Config::default()` is used. Every loaded config is
//! validated before it is returned.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::config::error::ConfigError;
use crate::config::schema::Config;
use crate::config::xdg;

/// Stateless configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` when given, otherwise from the default location.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_default(),
        }
    }

    /// Load `path`, which must exist.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = read_config(path)?.ok_or_else(|| ConfigError::NotFound {
            path: path.to_path_buf(),
        })?;
        Self::parse(&content, path)
    }

    /// Load the XDG config file, or defaults when there is none.
    pub fn load_default() -> Result<Config, ConfigError> {
        let path = xdg::config_path();
        match read_config(&path)? {
            Some(content) => Self::parse(&content, &path),
            None => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Deserialize and validate.
    fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| parse_error(&e, content, path))?;
        config.validate()?;
        Ok(config)
    }
}

/// File contents, or `None` when nothing exists at `path`.
fn read_config(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_error(e: &toml::de::Error, content: &str, path: &Path) -> ConfigError {
    let (line, column) = e
        .span()
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));
    ConfigError::ParseError {
        path: path.to_path_buf(),
        line,
        column,
        message: e.message().to_string(),
    }
}

/// 1-based line and column (in characters) of byte `offset`.
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = content.get(..offset).unwrap_or(content);
    let line_start = before.rfind('\n').map_or(0, |p| p + 1);
    let line = before.matches('\n').count() + 1;
    (line, before[line_start..].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use crate::config::xdg::tests::with_env;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    fn line_column_counts_from_one() {
        let content = "[log]\nlevel = 3\n";
        assert_eq!(line_column(content, 0), (1, 1));
        assert_eq!(line_column(content, 6), (2, 1));
        assert_eq!(line_column(content, 14), (2, 9));
    }

    #[test]
    fn line_column_counts_characters_not_bytes() {
        let content = "# é\nx = ";
        // 'x' sits after a two-byte character on the first line
        assert_eq!(line_column(content, 5), (2, 1));
        assert_eq!(line_column(content, 4), (1, 4));
    }

    // -----------------------------------------------------------------------
    // parse
    // -----------------------------------------------------------------------

    #[test]
    fn parse_partial_config_fills_defaults() {
        let path = PathBuf::from("partial.toml");
        let config = ConfigLoader::parse("[log]\nlevel = \"debug\"\n", &path)
            .expect("partial config should parse");
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.refresh.interval, "60s");
        assert_eq!(config.output.scale, 2.0);
    }

    #[test]
    fn parse_invalid_toml_returns_parse_error_with_position() {
        let path = PathBuf::from("bad.toml");
        let err = ConfigLoader::parse("key = \ninvalid", &path).expect_err("should fail");
        match err {
            ConfigError::ParseError {
                path: p,
                line,
                column,
                message,
            } => {
                assert_eq!(p, path);
                assert!(line > 0, "line should be > 0 for known span");
                assert!(column > 0, "column should be > 0 for known span");
                assert!(!message.is_empty(), "message should not be empty");
            }
            other => panic!("expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn parse_error_for_wrong_type_points_at_line() {
        let path = PathBuf::from("wrong_type.toml");
        let err = ConfigLoader::parse("[refresh]\n\ndiscard_stale = \"yes\"\n", &path)
            .expect_err("should fail");
        match err {
            ConfigError::ParseError { line, .. } => assert_eq!(line, 3),
            other => panic!("expected ParseError, got: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // load_from_path
    // -----------------------------------------------------------------------

    #[test]
    fn load_from_path_valid_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let file = dir.path().join("config.toml");
        fs::write(&file, "[log]\nlevel = \"trace\"\n").expect("failed to write temp file");
        let config = ConfigLoader::load_from_path(&file).expect("should load");
        assert_eq!(config.log.level, LogLevel::Trace);
    }

    #[test]
    fn parse_rejects_out_of_range_scale() {
        let err = ConfigLoader::parse("[output]\nscale = 1e6\n", Path::new("big.toml"))
            .expect_err("should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "output.scale",
                ..
            }
        ));
    }

    #[test]
    fn load_from_path_validates_values() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let file = dir.path().join("config.toml");
        fs::write(&file, "[refresh]\ninterval = \"often\"\n").expect("write");
        let err = ConfigLoader::load_from_path(&file).expect_err("should fail");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn load_from_path_missing_file_returns_not_found() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("nonexistent.toml");
        let err = ConfigLoader::load_from_path(&path).expect_err("should fail");
        match err {
            ConfigError::NotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn load_from_path_directory_returns_read_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let err = ConfigLoader::load_from_path(dir.path()).expect_err("should fail");
        match err {
            ConfigError::ReadError { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("expected ReadError, got: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // load_default
    // -----------------------------------------------------------------------

    #[test]
    #[serial]
    fn load_default_with_no_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        with_env(
            &[("XDG_CONFIG_HOME", Some(dir.path().to_str().expect("non-utf8 path")))],
            || {
                let config = ConfigLoader::load(None).expect("should return defaults");
                assert_eq!(config, Config::default());
            },
        );
    }

    #[test]
    #[serial]
    fn load_default_with_existing_file_parses_it() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config_dir = dir.path().join("pacebar");
        fs::create_dir_all(&config_dir).expect("failed to create config dir");
        fs::write(config_dir.join("config.toml"), "[log]\nlevel = \"warn\"\n")
            .expect("failed to write config");
        with_env(
            &[("XDG_CONFIG_HOME", Some(dir.path().to_str().expect("non-utf8 path")))],
            || {
                let config = ConfigLoader::load_default().expect("should load");
                assert_eq!(config.log.level, LogLevel::Warn);
            },
        );
    }
}
