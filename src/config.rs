use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::dashboard::Settings;
use crate::source::http::HttpSource;
use crate::source::sqlite::SqliteSource;
use crate::source::DataSource;
use crate::status::thresholds::Thresholds;

pub const MIN_REFRESH_MS: u64 = 1000;
pub const MAX_REFRESH_MS: u64 = 60_000;

#[derive(Parser, Debug)]
#[command(
    name = "minemon",
    version,
    about = "A terminal dashboard for underground air-quality monitoring"
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Dashboard refresh interval in milliseconds
    #[arg(short, long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1000..=60000))]
    pub refresh_rate: u64,

    /// Dashboard endpoint to poll (serves JSON on ?ajax=1)
    #[arg(short, long, value_name = "URL", conflicts_with = "db")]
    pub source: Option<String>,

    /// SQLite monitoring store to read directly
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Number of recent alerts to show
    #[arg(long, default_value_t = 3)]
    pub alert_limit: usize,

    /// TOML file overriding the default thresholds
    #[arg(long, value_name = "FILE")]
    pub thresholds: Option<PathBuf>,

    /// Log file used while the terminal UI is active
    #[arg(long, value_name = "PATH", default_value = "minemon.log")]
    pub log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the dashboard document over HTTP from a SQLite store
    Serve {
        #[arg(long, value_name = "PATH")]
        db: PathBuf,

        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_rate)
    }

    /// Opens whichever store the monitor was pointed at.
    pub fn open_source(&self) -> color_eyre::Result<Arc<dyn DataSource>> {
        match (&self.source, &self.db) {
            (Some(url), None) => Ok(Arc::new(HttpSource::new(url.clone()))),
            (None, Some(path)) => {
                let source = SqliteSource::open(path)
                    .wrap_err_with(|| format!("failed to open {}", path.display()))?;
                Ok(Arc::new(source))
            }
            (Some(_), Some(_)) => bail!("--source and --db cannot be used together"),
            (None, None) => bail!("no data source given; pass --source <URL> or --db <PATH>"),
        }
    }

    pub fn load_thresholds(&self) -> color_eyre::Result<Thresholds> {
        let Some(path) = &self.thresholds else {
            return Ok(Thresholds::default());
        };
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Thresholds::from_toml_str(&text)
            .wrap_err_with(|| format!("invalid thresholds in {}", path.display()))
    }

    pub fn dashboard_settings(&self) -> color_eyre::Result<Settings> {
        Ok(Settings {
            alert_limit: self.alert_limit,
            thresholds: self.load_thresholds()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["minemon", "--db", "mine.db"]).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.alert_limit, 3);
        assert_eq!(config.log_file, PathBuf::from("minemon.log"));
        assert!(config.command.is_none());
        assert_eq!(config.load_thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn refresh_rate_is_bounded() {
        assert!(Config::try_parse_from(["minemon", "-r", "500"]).is_err());
        assert!(Config::try_parse_from(["minemon", "-r", "60001"]).is_err());
        assert!(Config::try_parse_from(["minemon", "-r", "1000"]).is_ok());
    }

    #[test]
    fn source_and_db_conflict() {
        assert!(
            Config::try_parse_from(["minemon", "--source", "http://x", "--db", "mine.db"]).is_err()
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let config = Config::try_parse_from(["minemon"]).unwrap();
        assert!(config.open_source().is_err());
    }

    #[test]
    fn serve_subcommand() {
        let config =
            Config::try_parse_from(["minemon", "serve", "--db", "mine.db", "--bind", "0.0.0.0:9000"])
                .unwrap();
        match config.command {
            Some(Command::Serve { db, bind }) => {
                assert_eq!(db, PathBuf::from("mine.db"));
                assert_eq!(bind.port(), 9000);
            }
            None => panic!("expected serve"),
        }
    }

    #[test]
    fn missing_thresholds_file_is_reported() {
        let config =
            Config::try_parse_from(["minemon", "--thresholds", "/nonexistent/limits.toml"]).unwrap();
        assert!(config.load_thresholds().is_err());
    }
}
