//! Command-line interface definition.

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use icsnorm_core::{TracingConfig, TracingOutputFormat};
use tracing::Level;

use crate::config::{Environment, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::handler::CalendarQuery;
use crate::pipeline::Pipeline;
use crate::serve::serve;

/// icsnorm - normalize iCalendar feeds into one zone
#[derive(Debug, Parser)]
#[command(name = "icsnorm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "ICSNORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, global = true, env = "ICSNORM_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Deployment environment; only "dev" changes behavior
    #[arg(long, global = true, env = "ENVIRONMENT")]
    pub environment: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, env = "ICSNORM_BIND")]
        bind: Option<SocketAddr>,

        /// Upstream fetch timeout, in seconds
        #[arg(long)]
        fetch_timeout: Option<u64>,

        /// Cache-Control max-age, in seconds
        #[arg(long)]
        cache_max_age: Option<u64>,
    },

    /// Normalize one source and write the document
    Render {
        /// URL or local path of the source calendar
        #[arg(long, short)]
        source: String,

        /// Window start (ISO-8601)
        #[arg(long)]
        start: Option<String>,

        /// Window end (ISO-8601)
        #[arg(long)]
        end: Option<String>,

        /// Output zone
        #[arg(long)]
        tzid: Option<String>,

        /// Zone for times without one
        #[arg(long)]
        default_tzid: Option<String>,

        /// tzid, utc or floating
        #[arg(long)]
        tz_strategy: Option<String>,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Logging setup for this invocation.
    ///
    /// `serve` logs at INFO with timestamps, `render` stays quiet at WARN.
    pub fn tracing_config(&self) -> ServerResult<TracingConfig> {
        let mut config = match self.command {
            Command::Serve { .. } => TracingConfig::server(),
            Command::Render { .. } => TracingConfig::cli(),
        };
        if self.debug {
            config = config.with_level(Level::DEBUG);
        }
        if let Some(format) = &self.log_format {
            let format: TracingOutputFormat = format
                .parse()
                .map_err(|e| ServerError::config(format!("log format: {}", e)))?;
            config = config.with_format(format);
        }
        Ok(config)
    }

    /// Loads the config file and applies flag overrides on top.
    pub fn server_config(&self) -> ServerResult<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if self.environment.is_some() {
            config.environment = Environment::from_value(self.environment.as_deref());
        }
        if let Command::Serve {
            bind,
            fetch_timeout,
            cache_max_age,
        } = &self.command
        {
            if let Some(bind) = bind {
                config = config.with_bind(*bind);
            }
            if let Some(secs) = fetch_timeout {
                config = config.with_fetch_timeout_secs(*secs);
            }
            if let Some(secs) = cache_max_age {
                config = config.with_cache_max_age(*secs);
            }
        }
        config.validate()?;
        Ok(config)
    }
}

/// Runs the parsed command.
pub async fn run(cli: Cli) -> ServerResult<()> {
    let config = cli.server_config()?;

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Render {
            source,
            start,
            end,
            tzid,
            default_tzid,
            tz_strategy,
            output,
        } => {
            let query = CalendarQuery {
                source: Some(source),
                start,
                end,
                tzid,
                default_tzid,
                tz_strategy,
            };
            render(&config, query, output.as_deref()).await
        }
    }
}

/// Runs the pipeline once and writes the document.
///
/// The ETag goes to stderr so stdout stays a clean document.
pub async fn render(
    config: &ServerConfig,
    query: CalendarQuery,
    output: Option<&Path>,
) -> ServerResult<()> {
    let request = query.into_request(config)?;
    let pipeline = Pipeline::from_config(config)?;
    let normalized = pipeline.run(&request).await?;

    match output {
        Some(path) => tokio::fs::write(path, &normalized.body).await?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&normalized.body)?;
            stdout.flush()?;
        }
    }
    eprintln!("{}", normalized.etag);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use icsnorm_core::TzStrategy;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_override_config() {
        let cli = Cli::parse_from([
            "icsnorm",
            "--config",
            "/nonexistent/ignored.toml",
            "serve",
            "--bind",
            "0.0.0.0:9000",
        ]);
        // an explicit config path must exist
        assert!(cli.server_config().is_err());

        let cli = Cli::parse_from([
            "icsnorm",
            "--environment",
            "dev",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--cache-max-age",
            "60",
        ]);
        let config = cli.server_config().unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.cache_max_age, 60);
        assert!(config.environment.is_dev());
    }

    #[test]
    fn tracing_depends_on_command() {
        let serve = Cli::parse_from(["icsnorm", "serve"]);
        assert_eq!(serve.tracing_config().unwrap().default_level, Level::INFO);

        let render = Cli::parse_from(["icsnorm", "-v", "render", "--source", "feed.ics"]);
        assert_eq!(render.tracing_config().unwrap().default_level, Level::DEBUG);

        let bad = Cli::parse_from(["icsnorm", "--log-format", "xml", "serve"]);
        assert!(bad.tracing_config().is_err());
    }

    #[tokio::test]
    async fn render_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("feed.ics");
        std::fs::write(&source, crate::pipeline::tests::SAMPLE).unwrap();
        let output = dir.path().join("out.ics");

        let config = ServerConfig::default();
        let query = CalendarQuery {
            source: Some(source.display().to_string()),
            start: Some("2024-01-01".into()),
            end: Some("2024-02-01".into()),
            tz_strategy: Some(TzStrategy::Floating.to_string()),
            ..CalendarQuery::default()
        };
        render(&config, query, Some(&output)).await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("DTSTART:20240110T100000\r\n"));
        assert!(!text.contains("VTIMEZONE"));
    }
}
