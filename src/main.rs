//! CLI Entry Point for mikrotik-guardian
//!
//! # Usage
//!
//! Save credentials and connect:
//! ```bash
//! guardian configure --host 192.168.88.1:8728 --user api --pass secret
//! ```
//!
//! Watch the dashboard (Ctrl-C to stop):
//! ```bash
//! guardian monitor
//! ```
//!
//! Ask the AI service for a health report:
//! ```bash
//! GEMINI_API_KEY=... guardian analyze
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use guardian_client::{resolve_credentials, ConnectionSnapshot, DashboardState};
use guardian_core::Credentials;
use mikrotik_guardian::config::{GuardianConfig, DEFAULT_CONFIG_PATH};
use mikrotik_guardian::{dashboard, logging, AppError, Guardian};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guardian", version)]
#[command(about = "MikroTik router telemetry monitor with AI-assisted analysis", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save router credentials and connect
    Configure(CredentialArgs),

    /// Check credentials without saving them
    Test(CredentialArgs),

    /// Forget saved credentials
    Disconnect,

    /// Show live telemetry, reconnecting automatically
    Monitor {
        /// Take one reading and exit
        #[arg(long)]
        once: bool,
    },

    /// Request an AI analysis of the current snapshot
    Analyze,

    /// Print the effective configuration
    ShowConfig,
}

/// Router login. Missing values fall back to `MIKROTIK_HOST`,
/// `MIKROTIK_USER` and `MIKROTIK_PASS`.
#[derive(Args)]
struct CredentialArgs {
    /// Router address, `host[:port]`
    #[arg(long)]
    host: Option<String>,

    /// API user
    #[arg(long)]
    user: Option<String>,

    /// API password
    #[arg(long)]
    pass: Option<String>,
}

impl CredentialArgs {
    fn resolve(self) -> Credentials {
        let input = Credentials::new(
            self.host.unwrap_or_default().trim(),
            self.user.unwrap_or_default().trim(),
            self.pass.unwrap_or_default(),
        );
        match resolve_credentials(Some(&input), None) {
            Some(resolved) => {
                tracing::debug!(source = resolved.source.label(), "Using router credentials");
                resolved.credentials
            }
            // Let the connection manager report what is missing
            None => input,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GuardianConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.application.log_level = level;
    }
    config.validate().map_err(AppError::Validation)?;
    logging::init_from_config(&config).map_err(AppError::Logging)?;

    if let Commands::ShowConfig = cli.command {
        let mut shown = config.clone();
        if shown.analysis.api_key.is_some() {
            shown.analysis.api_key = Some("********".to_string());
        }
        print!("{}", shown.to_toml()?);
        return Ok(());
    }

    tracing::info!(name = %config.application.name, "Starting");
    let mut guardian = Guardian::new(config)?;

    match cli.command {
        Commands::Configure(args) => {
            let ok = guardian.configure(args.resolve()).await;
            report_outcome(ok, &guardian.status(), "Credentials saved, router connected")
        }
        Commands::Test(args) => {
            let ok = guardian.test(&args.resolve()).await;
            report_outcome(ok, &guardian.status(), "Connection successful")
        }
        Commands::Disconnect => {
            guardian.disconnect();
            println!("Saved credentials removed");
            Ok(())
        }
        Commands::Monitor { once: true } => {
            let state = guardian.poll_once().await;
            println!("{}", dashboard::render_status(&guardian.status()));
            match state {
                Some(state) => {
                    print!("{}", dashboard::render_dashboard(&state));
                    Ok(())
                }
                None => Err(anyhow!("not connected")),
            }
        }
        Commands::Monitor { once: false } => {
            run_monitor(&mut guardian).await;
            Ok(())
        }
        Commands::Analyze => run_analysis(&mut guardian).await,
        Commands::ShowConfig => Ok(()),
    }
}

fn report_outcome(ok: bool, status: &ConnectionSnapshot, success: &str) -> Result<()> {
    if ok {
        println!("{success}");
        Ok(())
    } else {
        Err(anyhow!(status
            .error
            .clone()
            .unwrap_or_else(|| "Connection failed".to_string())))
    }
}

async fn run_monitor(guardian: &mut Guardian) {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let mut last_status = String::new();
    let mut last_dashboard: Option<DashboardState> = None;
    guardian
        .monitor(shutdown, |status, state| {
            let line = dashboard::render_status(status);
            if line != last_status {
                println!("{line}");
                last_status = line;
            }
            if state.loading || last_dashboard.as_ref() == Some(state) {
                return;
            }
            let body = dashboard::render_dashboard(state);
            if !body.is_empty() {
                println!("{body}");
            }
            last_dashboard = Some(state.clone());
        })
        .await;
    println!("Stopped");
}

async fn run_analysis(guardian: &mut Guardian) -> Result<()> {
    if !guardian.initialize().await {
        let status = guardian.status();
        return Err(anyhow!(status
            .error
            .unwrap_or_else(|| "Router is not connected".to_string())));
    }

    let snapshot = guardian
        .fetch_snapshot()
        .await
        .map_err(|e| anyhow!(e.message))
        .context("Failed to fetch MikroTik data.")?;

    println!("Analyzing {} ...", snapshot.identity);
    let report = guardian.request_analysis(&snapshot).await;
    print!("{}", dashboard::render_report(&report));
    Ok(())
}
