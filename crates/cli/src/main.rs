//! `cmsremote` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: an optional JSON file, overridden by
//!    environment variables, overridden by flags.
//! 2. **Wire observability**: `tracing-subscriber` console output, plus an
//!    OpenTelemetry OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Open a session** through the SOAP adapter and print the requested
//!    view as JSON on stdout.

mod telemetry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::{json, Value};
use session::{
    Password, SessionConfig, SessionOptions, StrictMetadataPreference, TrustPolicy, TypeName,
};
use soap::SoapSession;
use tracing::info;

use crate::telemetry::LogFormat;

#[derive(Parser)]
#[command(name = "cmsremote", version, about = "Open an authenticated session against a content-management web service")]
struct Cli {
    /// JSON configuration file; flags and environment variables override it.
    #[arg(long, env = "CMSREMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Web services base URL, e.g. https://example.com/ISHWS/
    #[arg(long, env = "CMSREMOTE_URL")]
    url: Option<String>,

    /// Account name; defaults to the operating system user.
    #[arg(long, env = "CMSREMOTE_USER")]
    user: Option<String>,

    /// Password; omit for ambient-identity login.
    #[arg(long, env = "CMSREMOTE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connect and read timeout in seconds.
    #[arg(long, env = "CMSREMOTE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Accept any server certificate. Insecure; for test servers only.
    #[arg(long, env = "CMSREMOTE_INSECURE")]
    insecure: bool,

    /// Handling of metadata fields unknown to the field setup.
    #[arg(long, value_enum, env = "CMSREMOTE_STRICT_METADATA")]
    strict_metadata: Option<Strictness>,

    /// Console log format.
    #[arg(long, value_enum, env = "CMSREMOTE_LOG_FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print handshake results (default)
    Info,
    /// Print the resolved type field setup
    FieldSetup {
        /// Restrict output to one object type, e.g. ISHModule
        #[arg(long)]
        object_type: Option<String>,
    },
    /// Print the current user's display name and language
    Whoami,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strictness {
    Off,
    Continue,
    Warn,
    Reject,
}

impl From<Strictness> for StrictMetadataPreference {
    fn from(value: Strictness) -> Self {
        match value {
            Strictness::Off => Self::Off,
            Strictness::Continue => Self::Continue,
            Strictness::Warn => Self::Warn,
            Strictness::Reject => Self::Reject,
        }
    }
}

/// Settings read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
    trust_policy: Option<TrustPolicy>,
    options: Option<SessionOptions>,
}

impl FileConfig {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing configuration file {}", path.display()))
    }
}

fn session_config(cli: &Cli, file: FileConfig) -> anyhow::Result<SessionConfig> {
    let url = cli
        .url
        .clone()
        .or(file.url)
        .context("no base URL; pass --url, set CMSREMOTE_URL or add \"url\" to the configuration file")?;

    let mut config = SessionConfig::new(url);
    if let Some(user) = cli.user.clone().or(file.user) {
        let password = cli.password.clone().or(file.password).map(Password::new);
        config = config.with_credentials(user, password);
    } else if let Some(password) = cli.password.clone().or(file.password) {
        config.password = Some(Password::new(password));
    }
    if let Some(secs) = cli.timeout_secs.or(file.timeout_secs) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let trust_policy = if cli.insecure {
        TrustPolicy::AcceptAnyCertificate
    } else {
        file.trust_policy.unwrap_or_default()
    };
    config = config.with_trust_policy(trust_policy);

    let mut options = file.options.unwrap_or_default();
    if let Some(strictness) = cli.strict_metadata {
        options.strict_metadata = strictness.into();
    }
    Ok(config.with_options(options))
}

fn info_view(session: &SoapSession) -> Value {
    json!({
        "session_id": session.id(),
        "name": session.name(),
        "opened_at": session.opened_at(),
        "base_url": session.base_url().as_str(),
        "announced_url": session.connection().service_url.as_str(),
        "application": session.connection().application_name.as_str(),
        "user": session.user_name().as_str(),
        "server_version": session.server_version().to_string(),
        "server_version_text": session.server_version_text(),
        "client_version": session.client_version().to_string(),
        "trust_policy": session.trust_policy(),
        "timeout_secs": session.timeout().as_secs(),
        "options": session.options(),
    })
}

async fn field_setup_view(session: &SoapSession, object_type: Option<&str>) -> anyhow::Result<Value> {
    let resolved = session.type_field_setup().await?;
    let filter = object_type
        .map(|name| TypeName::new(name).context("object type must not be empty"))
        .transpose()?;

    let definitions: Vec<Value> = resolved
        .setup()
        .definitions()
        .filter(|definition| filter.as_ref().is_none_or(|wanted| &definition.object_type == wanted))
        .map(|definition| {
            json!({
                "object_type": definition.object_type.as_str(),
                "name": definition.name.as_str(),
                "level": definition.level,
                "data_type": format!("{:?}", definition.data_type),
                "multi_value": definition.multi_value,
                "mandatory": definition.mandatory,
                "basic": definition.basic,
                "descriptive": definition.descriptive,
                "reference_list": definition.reference_list,
                "binding_source": definition.binding_source,
            })
        })
        .collect();

    Ok(json!({
        "source": format!("{:?}", resolved.source()),
        "overlay_merged": resolved.overlay_merged(),
        "strictness": resolved.strictness(),
        "definitions": definitions,
    }))
}

async fn whoami_view(session: &SoapSession) -> anyhow::Result<Value> {
    Ok(json!({
        "user": session.user_name().as_str(),
        "display_name": session.current_user_display_name().await?,
        "language": session.current_user_language().await?,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = telemetry::init(cli.log_format)?;

    let result = run(&cli).await;
    telemetry.shutdown();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = session_config(cli, file)?;

    let session = soap::connect(config).await.context("opening session")?;
    info!(session = %session.name(), version = %session.server_version(), "Session opened");

    let view = match &cli.command {
        None | Some(Command::Info) => info_view(&session),
        Some(Command::FieldSetup { object_type }) => field_setup_view(&session, object_type.as_deref()).await?,
        Some(Command::Whoami) => whoami_view(&session).await?,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);

    session.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cmsremote").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_file_values() {
        let cli = parse(&["--url", "https://flag.example.com/ISHWS", "--timeout-secs", "7", "--strict-metadata", "warn"]);
        let file: FileConfig = serde_json::from_str(
            r#"{"url":"https://file.example.com/ISHWS","user":"svc","password":"pw","timeout_secs":3,
                "options":{"metadata_batch_size":100}}"#,
        )
        .unwrap();

        let config = session_config(&cli, file).unwrap();
        assert_eq!(config.base_url, "https://flag.example.com/ISHWS");
        assert_eq!(config.user_name.as_deref(), Some("svc"));
        assert_eq!(config.password.as_ref().map(Password::expose), Some("pw"));
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.options.metadata_batch_size(), 100);
        assert_eq!(config.options.strict_metadata, StrictMetadataPreference::Warn);
        assert_eq!(config.trust_policy, TrustPolicy::ValidateCertificates);
    }

    #[test]
    fn insecure_flag_selects_accept_any() {
        let cli = parse(&["--url", "https://a/", "--insecure"]);
        let config = session_config(&cli, FileConfig::default()).unwrap();
        assert_eq!(config.trust_policy, TrustPolicy::AcceptAnyCertificate);
        assert!(config.user_name.is_none());
    }

    #[test]
    fn missing_url_is_an_error() {
        let cli = parse(&[]);
        assert!(session_config(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(serde_json::from_str::<FileConfig>(r#"{"uri":"https://a/"}"#).is_err());
    }
}
