//! rpitx-remote - Entry point
//!
//! Parses CLI arguments, merges them with the persisted settings file,
//! connects to the Raspberry Pi, and dispatches the requested operation.
//! During a transmission, SIGINT/SIGTERM trigger the emergency stop
//! sequence before the session is closed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rpitx_remote::config::{Args, Command, Config, PresetAction};
use rpitx_remote::error::{Result, RpitxError};
use rpitx_remote::settings::{settings_path, Preset, Settings};
use rpitx_remote::ssh::{sanitize_command, SshConfig, SshConnectionManager};
use rpitx_remote::transmit::{
    run_emergency_stop, ModeArg, ModeParams, StopReport, Transmitter, TxMode,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; stdout is reserved for command results
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments and load the settings file
    let args = Args::parse();
    let settings_file = settings_path(args.settings.as_deref());
    let mut settings = Settings::load(&settings_file)?;

    // Preset management never touches the network
    if let Command::Preset { ref action } = args.command {
        return handle_preset(action.clone(), &mut settings, &settings_file);
    }

    let config = Config::resolve(&args, &settings)?;

    info!("rpitx-remote v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Target: {}@{}:{}", config.user, config.host, config.port);

    let connection = Arc::new(build_connection(&config).await?);
    connection.connect().await?;

    // Persist connection overrides once the credentials are proven good
    config.persist_into(&mut settings);
    settings.save(&settings_file)?;

    let timeout = Duration::from_millis(config.timeout_ms);

    let result = match args.command {
        Command::Transmit {
            mode,
            freq,
            file,
            message,
            bandwidth,
            speed,
        } => {
            let params = TransmitArgs {
                mode,
                freq: freq.unwrap_or(settings.frequency),
                file,
                message,
                bandwidth: bandwidth.unwrap_or(settings.chirp_bandwidth),
                speed: speed.unwrap_or(settings.chirp_speed),
            };
            handle_transmit(&connection, &config, params).await
        }
        Command::Stop => {
            let report = run_emergency_stop(&connection).await?;
            print_stop_report(&report);
            Ok(())
        }
        Command::Upload { local } => {
            let filename = local
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    RpitxError::invalid_params(format!("{} has no file name", local.display()))
                })?;
            let remote_path = connection.upload_file(&local, &filename).await?;
            println!("{}", remote_path);
            Ok(())
        }
        Command::Exec { command } => {
            let sanitized = sanitize_command(&command)?;
            let output = connection.exec_command(&sanitized, timeout).await?;
            print!("{}", output.combined_output());
            if !output.success() {
                warn!("Remote command exited with {:?}", output.exit_code);
            }
            Ok(())
        }
        Command::Preset { .. } => unreachable!("handled before connecting"),
    };

    connection.close().await;
    result
}

/// Resolved transmit parameters after merging CLI flags with settings
struct TransmitArgs {
    mode: TxMode,
    freq: f64,
    file: Option<std::path::PathBuf>,
    message: Option<String>,
    bandwidth: u32,
    speed: u32,
}

/// Build the connection manager, reading the key file if one is configured
async fn build_connection(config: &Config) -> Result<SshConnectionManager> {
    let mut ssh_config = SshConfig::new(&config.host, &config.user).with_port(config.port);

    if let Some(ref password) = config.password {
        ssh_config = ssh_config.with_password(password);
    }

    if let Some(ref key_path) = config.key {
        let key_content = tokio::fs::read_to_string(key_path)
            .await
            .map_err(RpitxError::Io)?;
        ssh_config = ssh_config.with_private_key(&key_content);
    }

    Ok(SshConnectionManager::new(ssh_config))
}

/// Run a transmission until the remote process exits or a signal arrives
async fn handle_transmit(
    connection: &Arc<SshConnectionManager>,
    config: &Config,
    args: TransmitArgs,
) -> Result<()> {
    let mut params = ModeParams {
        bandwidth: args.bandwidth,
        speed: args.speed,
        ..Default::default()
    };

    // File modes stage their payload before the transmission starts
    if let Some(remote_filename) = args.mode.remote_filename() {
        let local = args.file.ok_or_else(|| {
            RpitxError::invalid_params(format!(
                "{} requires --file",
                args.mode.script()
            ))
        })?;
        params.remote_file = Some(connection.upload_file(&local, remote_filename).await?);
    }

    if matches!(args.mode.arg(), ModeArg::Text) {
        params.text = Some(args.message.ok_or_else(|| {
            RpitxError::invalid_params(format!("{} requires --message", args.mode.script()))
        })?);
    }

    let transmitter = Transmitter::new(Arc::clone(connection), &config.rpitx_path);
    transmitter.run(args.mode, args.freq, &params).await?;

    info!(
        "Transmitting {} at {} MHz, press Ctrl-C to stop",
        args.mode.script(),
        args.freq
    );

    // Register both listeners once; re-creating them inside the loop
    // would leave a window where a signal arrives between iterations
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let terminate = terminate_signal();
    tokio::pin!(terminate);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received SIGINT (Ctrl+C), stopping transmission...");
                let report = transmitter.stop().await?;
                print_stop_report(&report);
                break;
            }
            _ = &mut terminate => {
                info!("Received SIGTERM, stopping transmission...");
                let report = transmitter.stop().await?;
                print_stop_report(&report);
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                if !transmitter.is_transmitting() {
                    info!("Transmission finished");
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Resolve when SIGTERM arrives (never resolves on non-unix platforms)
async fn terminate_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");
        sigterm.recv().await;
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

/// Preset CRUD against the settings file
fn handle_preset(action: PresetAction, settings: &mut Settings, path: &Path) -> Result<()> {
    match action {
        PresetAction::Save {
            name,
            freq,
            bandwidth,
            speed,
        } => {
            let preset = Preset {
                name: name.clone(),
                frequency: freq.unwrap_or(settings.frequency),
                bandwidth: bandwidth.unwrap_or(settings.chirp_bandwidth),
                speed: speed.unwrap_or(settings.chirp_speed),
            };
            settings.save_preset(preset);
            settings.save(path)?;
            println!("Saved preset '{}'", name);
        }
        PresetAction::Load { name } => {
            settings.apply_preset(&name)?;
            settings.save(path)?;
            println!(
                "Loaded preset '{}': {} MHz, bandwidth {} Hz, speed {} s",
                name, settings.frequency, settings.chirp_bandwidth, settings.chirp_speed
            );
        }
        PresetAction::List => {
            if settings.saved_presets.is_empty() {
                println!("No presets saved");
            }
            for preset in &settings.saved_presets {
                println!(
                    "{}: {} MHz, bandwidth {} Hz, speed {} s",
                    preset.name, preset.frequency, preset.bandwidth, preset.speed
                );
            }
        }
        PresetAction::Delete { name } => {
            if settings.delete_preset(&name) {
                settings.save(path)?;
                println!("Deleted preset '{}'", name);
            } else {
                println!("No preset named '{}'", name);
            }
        }
    }
    Ok(())
}


/// Report the force-stop verification result on stdout
fn print_stop_report(report: &StopReport) {
    if report.all_stopped {
        println!("Transmission fully stopped");
    } else {
        println!("Warning: some processes might still be running");
        if !report.remaining_processes.is_empty() {
            println!("  pids: {}", report.remaining_processes.replace('\n', " "));
        }
        if let Some(ref level) = report.gpio_level {
            println!("  gpio 4 level: {}", level);
        }
    }
}
