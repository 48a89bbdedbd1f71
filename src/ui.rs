// UI layer: the command-line flow. Resolves the config, asks for missing
// qBittorrent settings when a terminal is attached, then logs in and hands
// the magnet over. The qBittorrent client is always passed in, so the flow
// can be driven by a mock in tests.

use crate::api::{SessionClient, TorrentClient};
use crate::cli::Cli;
use crate::config::{self, Config};
use crate::logging;
use crate::transport::ReqwestTransport;
use anyhow::{bail, Context, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Full program run for already-parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_file);
    let loaded = Config::load(&config_path);

    // Logging depends on the config, so a load failure is logged with the
    // default level.
    let (mut cfg, used_defaults) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            logging::init(cli.log_level.as_deref().unwrap_or("info"), None);
            error!("failed to load config: {e}");
            return Err(e.into());
        }
    };
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    logging::init(&level, cfg.log_file.as_deref());

    if used_defaults || cfg.needs_qb_setup() {
        ensure_qb_config(&mut cfg, &config_path, std::io::stdin().is_terminal())?;
    }

    if let Some(magnet) = cli.magnet.as_deref() {
        cfg.validate_qb()?;
        let transport = ReqwestTransport::new(cfg.request_timeout())
            .context("failed to build HTTP client")?;
        let mut client =
            SessionClient::new(&cfg.qb_host, &cfg.qb_username, &cfg.qb_password, transport)?;
        if let Err(e) = process_magnet(&mut client, magnet, &cfg.qb_host) {
            error!("failed to process magnet: {e:#}");
            return Err(e);
        }
    }

    print_summary(&config_path, used_defaults, &cfg, cli.magnet.as_deref());
    Ok(())
}

/// Make sure host and credentials are present, prompting for them when
/// possible and saving the result to `path`.
pub fn ensure_qb_config(cfg: &mut Config, path: &Path, interactive: bool) -> Result<()> {
    if !interactive {
        bail!(
            "config missing and no TTY available; create {} manually with qbHost/qbUsername/qbPassword",
            path.display()
        );
    }

    println!("Config not found or incomplete. Please provide qBittorrent settings.");
    cfg.qb_host = prompt_value("qBittorrent host (e.g. http://localhost:8080)", &cfg.qb_host)?;
    cfg.qb_username = prompt_value("qBittorrent username", &cfg.qb_username)?;
    let password = Password::new()
        .with_prompt("qBittorrent password")
        .allow_empty_password(!cfg.qb_password.is_empty())
        .interact()?;
    if !password.is_empty() {
        cfg.qb_password = password;
    }

    cfg.validate_qb()?;
    cfg.save(path)?;
    info!("config written to {}", path.display());
    Ok(())
}

/// Prompt for one value, keeping `current` when the user just hits enter.
fn prompt_value(label: &str, current: &str) -> Result<String> {
    let mut input = Input::<String>::new();
    input.with_prompt(label);
    if !current.is_empty() {
        input.default(current.to_string());
    }
    let value = input.interact_text()?;
    Ok(value.trim().to_string())
}

/// Log in and submit `magnet`. Errors keep the client's message and say
/// which step failed.
pub fn process_magnet<C>(client: &mut C, magnet: &str, host: &str) -> Result<()>
where
    C: TorrentClient + ?Sized,
{
    let spinner = spinner("Logging in to qBittorrent...");
    let outcome = client
        .login()
        .context("qbittorrent login failed")
        .and_then(|()| {
            spinner.set_message("Sending magnet...");
            client
                .add_magnet(magnet)
                .context("could not send magnet to qbittorrent")
        });
    spinner.finish_and_clear();
    outcome?;

    info!("magnet forwarded to qBittorrent at {host}");
    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(config_path: &Path, used_defaults: bool, cfg: &Config, magnet: Option<&str>) {
    println!("{} wired and running", config::APP_NAME);
    println!("  version      : {}", env!("CARGO_PKG_VERSION"));
    println!("  config path  : {}", config_path.display());
    println!("  used defaults: {used_defaults}");
    println!("  save dir     : {}", cfg.save_dir);
    println!("  log level    : {}", cfg.log_level);
    println!("  magnet arg   : {}", magnet.unwrap_or("<none provided>"));
}
