mod cli;
mod commands;
mod config;
mod observability;
mod output;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use authsync_gateway::{AuthMethodGateway, GatewayConfig, HttpGateway, MemoryGateway};
use authsync_reconciler::{AuthMethodResource, Reconciler, ReconcilerConfig, VersionPolicy};

use cli::{Cli, Commands};
use commands::Session;
use config::ProfileConfig;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile_name = &cli.profile;
    let profile = config::load_profile(profile_name)?;

    let level = cli
        .log_level
        .as_deref()
        .or(profile.log_level.as_deref())
        .unwrap_or("warn");
    observability::init_tracing_with_level(level);

    match &cli.command {
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile_name);
                println!(
                    "{}: {}",
                    "Address".cyan(),
                    profile.addr.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Token".cyan(),
                    if profile.token.is_some() { "(set)" } else { "(not set)" }
                );
                println!(
                    "{}: {}",
                    "Log level".cyan(),
                    profile.log_level.as_deref().unwrap_or("warn")
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = profile.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile_name, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Show(args) => {
            commands::show::show(&cli.state, args.format)?;
        }
        Commands::Apply(args) => {
            let session = make_session(&cli, &profile)?;
            commands::lifecycle::apply(&session, &args.file).await?;
        }
        Commands::Refresh => {
            let session = make_session(&cli, &profile)?;
            commands::lifecycle::refresh(&session).await?;
        }
        Commands::Destroy => {
            let session = make_session(&cli, &profile)?;
            commands::lifecycle::destroy(&session).await?;
        }
        Commands::Import(args) => {
            let session = make_session(&cli, &profile)?;
            commands::lifecycle::import(&session, &args.id).await?;
        }
    }

    Ok(())
}

fn make_gateway(cli: &Cli, profile: &ProfileConfig) -> Result<Arc<dyn AuthMethodGateway>> {
    if cli.memory {
        tracing::info!("using in-process auth service");
        return Ok(Arc::new(MemoryGateway::new()));
    }

    let addr = config::resolve_addr(cli.addr.as_deref(), profile)?;
    let mut gateway_config =
        GatewayConfig::new(addr).with_request_timeout(Duration::from_secs(cli.timeout));
    if let Some(token) = cli.token.as_ref().or(profile.token.as_ref()) {
        gateway_config = gateway_config.with_token(token.clone());
    }
    Ok(Arc::new(HttpGateway::new(gateway_config)?))
}

fn make_session(cli: &Cli, profile: &ProfileConfig) -> Result<Session> {
    let policy = if cli.read_before_write {
        VersionPolicy::ReadBeforeWrite
    } else {
        VersionPolicy::Automatic
    };
    let reconciler = Reconciler::new(
        make_gateway(cli, profile)?,
        ReconcilerConfig::default().with_version_policy(policy),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight request");
            on_interrupt.cancel();
        }
    });

    Ok(Session {
        resource: AuthMethodResource::new(reconciler),
        cancel,
        state_path: cli.state.clone(),
    })
}
