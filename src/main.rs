use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use levelwatch::duration::{format_duration, parse_duration};
use levelwatch::monitor::send_with_timeout;
use levelwatch::{
    logging, AlertMessage, EmailNotifier, GpioSensor, LogNotifier, Monitor, Notifier, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "levelwatch")]
#[command(about = "Float switch water level monitor with email alerts")]
struct Args {
    /// Path to the TOML config file (default: ./levelwatch.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor the water level until Ctrl+C or SIGTERM
    Run,
    /// Print the raw pin level on an interval (hardware check)
    ReadSensor {
        /// Time between readings (e.g., "500ms", "1s")
        #[arg(short, long, default_value = "500ms", value_parser = parse_duration)]
        interval: Duration,
    },
    /// Send a test email with the configured settings
    TestEmail {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the effective settings as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;

    let command = args.command.unwrap_or(Command::Run);

    // Flushes the log file on exit.
    let _log_guard = match command {
        Command::ShowConfig => None,
        _ => logging::init(&settings.logging)?,
    };

    match command {
        Command::Run => run(settings).await,
        Command::ReadSensor { interval } => read_sensor(&settings, interval).await,
        Command::TestEmail { yes } => test_email(&settings, yes).await,
        Command::ShowConfig => {
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{}", json);
            Ok(())
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    print_banner(&settings);

    let sensor = GpioSensor::open_async(
        settings.sensor.gpio_root.clone(),
        settings.sensor.pin,
        settings.sensor.ok_level,
    )
    .await
    .with_context(|| format!("Failed to initialize GPIO pin {}", settings.sensor.pin))?;

    let notifier = build_notifier(&settings);
    let mut monitor = Monitor::new(settings.monitor_config(), notifier)?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let report = monitor.run(sensor, cancel).await?;
    tracing::info!(
        ticks = report.ticks,
        failed_reads = report.failed_reads,
        notifications_suppressed = report.notifications_suppressed,
        "Water level monitor stopped"
    );
    Ok(())
}

async fn read_sensor(settings: &Settings, interval: Duration) -> Result<()> {
    if interval.is_zero() {
        bail!("--interval must be greater than zero");
    }

    let sensor = GpioSensor::open_async(
        settings.sensor.gpio_root.clone(),
        settings.sensor.pin,
        settings.sensor.ok_level,
    )
    .await
    .with_context(|| format!("Failed to initialize GPIO pin {}", settings.sensor.pin))?;

    println!(
        "Reading GPIO pin {} every {} (Ctrl+C to stop)",
        sensor.pin(),
        format_duration(interval)
    );
    println!("Level OK when pin is {:?}", sensor.ok_level());

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match sensor.read_level() {
            Ok(level) => {
                let status = if level == sensor.ok_level() {
                    "OK"
                } else {
                    "LOW (float switch triggered)"
                };
                println!("GPIO {}: {} -> {}", sensor.pin(), level.as_bit(), status);
            }
            Err(e) => println!("GPIO {}: read failed: {}", sensor.pin(), e),
        }
    }

    println!("Sensor test ended");
    Ok(())
}

async fn test_email(settings: &Settings, yes: bool) -> Result<()> {
    let email = &settings.email;
    println!("SMTP server: {}:{}", email.smtp_server, email.smtp_port);
    println!("From:        {}", email.from);
    println!("To:          {}", email.to.join(", "));

    let missing = email.missing_fields();
    if !missing.is_empty() {
        bail!("Email settings incomplete, missing: {}", missing.join(", "));
    }

    if !yes && !confirm("Send a test email now? [y/N] ")? {
        println!("Cancelled");
        return Ok(());
    }

    let notifier = EmailNotifier::new(email.clone());
    let message = AlertMessage::test(&settings.message_context());
    match send_with_timeout(
        &notifier,
        &message,
        &email.to,
        settings.monitor.send_timeout,
    )
    .await
    {
        Ok(()) => {
            println!("Test email sent to {}", email.to.join(", "));
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to send test email: {}", e);
            eprintln!();
            eprintln!("Common causes:");
            eprintln!("  - Gmail requires an app password, not the account password");
            eprintln!("  - 2-step verification must be enabled to create an app password");
            eprintln!("  - Outbound port {} may be blocked by the network", email.smtp_port);
            eprintln!("  - The sender or recipient address may be mistyped");
            Err(e).context("Test email failed")
        }
    }
}

fn build_notifier(settings: &Settings) -> Box<dyn Notifier> {
    if !settings.email.enabled {
        tracing::warn!("Email notifications disabled, alerts will only be logged");
        return Box::new(LogNotifier::new());
    }

    let missing = settings.email.missing_fields();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "Email settings incomplete, notifications will fail"
        );
    }
    Box::new(EmailNotifier::new(settings.email.clone()))
}

fn print_banner(settings: &Settings) {
    println!("==================================================");
    println!("Water Level Monitor");
    println!("==================================================");
    println!("GPIO pin:       {}", settings.sensor.pin);
    println!(
        "Check interval: {}",
        format_duration(settings.monitor.check_interval)
    );
    println!(
        "Debounce time:  {}",
        format_duration(settings.monitor.debounce_time)
    );
    println!("Cooldown:       {}", format_duration(settings.monitor.cooldown));
    println!(
        "Email alerts:   {}",
        if settings.email.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("Press Ctrl+C to stop");
    println!("==================================================");
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Cancel `token` on Ctrl+C, or on SIGTERM where supported.
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        token.cancel();
    });
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
