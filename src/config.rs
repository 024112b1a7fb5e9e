//! Command-line and environment configuration

use clap::{Args, ValueEnum};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Options shared by every subcommand
#[derive(Args, Clone, Debug, Default)]
pub struct Config {
    /// Namespace to operate in (defaults to the kubeconfig context namespace)
    #[arg(short, long, global = true, env = "APPSTUDIO_NAMESPACE")]
    pub namespace: Option<String>,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "APPSTUDIO_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

impl Config {
    /// Namespace to use, falling back to `default_namespace`
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }

    /// Install the global tracing subscriber; `RUST_LOG` overrides the `info` default
    pub fn init_tracing(&self) {
        let env_filter = EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .from_env_lossy();

        let registry = tracing_subscriber::registry().with(env_filter);
        match self.log_format {
            LogFormat::Text => registry
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn namespace_falls_back_to_default() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.config.namespace_or("default"), "default");

        let cli = TestCli::parse_from(["test", "-n", "team-a"]);
        assert_eq!(cli.config.namespace_or("default"), "team-a");
    }

    #[test]
    fn log_format_parses() {
        let cli = TestCli::parse_from(["test", "--log-format", "json"]);
        assert_eq!(cli.config.log_format, LogFormat::Json);
    }
}
