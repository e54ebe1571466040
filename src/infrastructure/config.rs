// Configuration loading - Optional config file layered under environment variables
use crate::application::layered_layout::LayoutSettings;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub layout: LayoutSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Serve the JSON fixtures in-process.
    #[default]
    Fixtures,
    /// Forward to a backend exposing the same routes.
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub source: DataSource,
    pub fixtures_dir: PathBuf,
    pub remote_base_url: Option<String>,
    pub changelog_limit: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: DataSource::Fixtures,
            fixtures_dir: PathBuf::from("data"),
            remote_base_url: None,
            changelog_limit: 10,
        }
    }
}

/// `config/app.*` (optional) overridden by `CYCLE_MONITOR__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(File::with_name("config/app").required(false))
        .add_source(Environment::with_prefix("CYCLE_MONITOR").prefix_separator("__").separator("__"));

    from_sources(builder)
}

fn from_sources(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    let app: AppConfig = settings.try_deserialize()?;

    if app.data.source == DataSource::Remote && app.data.remote_base_url.is_none() {
        anyhow::bail!("data.remote_base_url is required when data.source = \"remote\"");
    }

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> anyhow::Result<AppConfig> {
        from_sources(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_without_file() {
        let app = parse("").unwrap();

        assert_eq!(app.server.bind, "0.0.0.0:8080");
        assert_eq!(app.data.source, DataSource::Fixtures);
        assert_eq!(app.data.changelog_limit, 10);
        assert_eq!(app.layout.node_width, 450.0);
        assert_eq!(app.layout.rank_sep, 50.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let app = parse(
            r#"
            [data]
            fixtures_dir = "fixtures"

            [layout]
            node_sep = 80.0
            "#,
        )
        .unwrap();

        assert_eq!(app.data.fixtures_dir, PathBuf::from("fixtures"));
        assert_eq!(app.data.changelog_limit, 10);
        assert_eq!(app.layout.node_sep, 80.0);
        assert_eq!(app.layout.node_height, 50.0);
    }

    #[test]
    fn test_remote_source_needs_base_url() {
        assert!(parse("[data]\nsource = \"remote\"").is_err());

        let app = parse("[data]\nsource = \"remote\"\nremote_base_url = \"http://backend:9000\"").unwrap();
        assert_eq!(app.data.source, DataSource::Remote);
    }
}
