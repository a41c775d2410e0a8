//! Command-line and environment configuration

use std::net::SocketAddr;
use std::time::Duration;

use buttrest_api::ApiSettings;
use clap::{Parser, Subcommand};
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "buttrestd")]
#[command(author, version, about = "Hypermedia REST API for Intiface devices")]
pub struct Cli {
    /// Name announced to the Intiface server
    #[arg(long, env = "BUTTREST_CLIENT_NAME")]
    pub client_name: String,

    /// Websocket URL of the Intiface server
    #[arg(
        long,
        env = "BUTTREST_INTIFACE_URL",
        value_parser = parse_ws_url,
        required_unless_present = "simulate"
    )]
    pub intiface_url: Option<Url>,

    /// Address the HTTP server listens on
    #[arg(long, env = "BUTTREST_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Length of the device discovery window, in milliseconds
    #[arg(long, env = "BUTTREST_SCAN_WINDOW_MS", default_value_t = 3000)]
    pub scan_window_ms: u64,

    /// Deadline for a sensor read, in milliseconds
    #[arg(
        long,
        env = "BUTTREST_READ_TIMEOUT_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub read_timeout_ms: u64,

    /// Serve simulated devices instead of connecting to Intiface
    #[arg(long, env = "BUTTREST_SIMULATE")]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Serve the REST API (default)
    Serve,

    /// Drive one actuator at a fixed intensity for a while, then disconnect
    Actuate {
        /// Device index
        #[arg(long)]
        device: u32,

        /// Actuator index within the device's scalar actuators
        #[arg(long)]
        actuator: u32,

        /// Intensity between 0.0 and 1.0
        #[arg(long, value_parser = parse_unit_interval)]
        intensity: f64,

        /// How long to keep the actuator running, in seconds
        #[arg(long, default_value_t = 1)]
        duration: u64,
    },
}

impl Cli {
    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            scan_window: Duration::from_millis(self.scan_window_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

fn parse_ws_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {}", e))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(format!(
            "unsupported scheme '{}', expected ws or wss",
            other
        )),
    }
}

fn parse_unit_interval(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{}' is not a number", raw))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err("must be between 0.0 and 1.0".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from([
            "buttrestd",
            "--client-name",
            "buttrest",
            "--intiface-url",
            "ws://127.0.0.1:12345",
        ])
        .unwrap();

        assert_eq!(cli.listen, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.settings(), ApiSettings::default());
        assert_eq!(cli.command(), Command::Serve);
        assert_eq!(cli.intiface_url.unwrap().port(), Some(12345));
    }

    #[test]
    fn url_is_required_unless_simulating() {
        assert!(Cli::try_parse_from(["buttrestd", "--client-name", "buttrest"]).is_err());

        let cli =
            Cli::try_parse_from(["buttrestd", "--client-name", "buttrest", "--simulate"]).unwrap();
        assert!(cli.simulate);
        assert!(cli.intiface_url.is_none());
    }

    #[test]
    fn non_websocket_url_is_rejected() {
        assert!(parse_ws_url("http://127.0.0.1:12345").is_err());
        assert!(parse_ws_url("not a url").is_err());
        assert!(parse_ws_url("wss://intiface.local/").is_ok());
    }

    #[test]
    fn actuate_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "buttrestd",
            "--client-name",
            "buttrest",
            "--simulate",
            "actuate",
            "--device",
            "0",
            "--actuator",
            "1",
            "--intensity",
            "0.5",
            "--duration",
            "10",
        ])
        .unwrap();

        assert_eq!(
            cli.command(),
            Command::Actuate {
                device: 0,
                actuator: 1,
                intensity: 0.5,
                duration: 10
            }
        );
    }

    #[test]
    fn actuate_rejects_out_of_range_intensity() {
        assert!(parse_unit_interval("1.5").is_err());
        assert!(parse_unit_interval("fast").is_err());
        assert_eq!(parse_unit_interval("0").unwrap(), 0.0);
    }

    #[test]
    fn zero_read_timeout_is_rejected() {
        assert!(Cli::try_parse_from([
            "buttrestd",
            "--client-name",
            "buttrest",
            "--simulate",
            "--read-timeout-ms",
            "0",
        ])
        .is_err());
    }
}
