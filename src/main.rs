use anyhow::Context;
use clap::Parser;
use scanner_bridge::adapters::native::{list_ports, NativePortRequester};
use scanner_bridge::adapters::replay::ReplayPortRequester;
use scanner_bridge::adapters::scan_log::CsvScanLog;
use scanner_bridge::adapters::sinks::{CallbackSink, FanoutSink, ScanPrinter};
use scanner_bridge::core::{ConnectionState, PortRequester, StateSink};
use scanner_bridge::utils::error::ErrorSeverity;
use scanner_bridge::utils::{logger, validation::Validate};
use scanner_bridge::{BridgeError, CliConfig, DeviceSource, ScannerBridge, Settings, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let file_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    let log_level = logger::effective_level(file_config.log_level(), cli.verbose);
    if file_config.json_logs() {
        logger::init_json_logger(log_level);
    } else {
        logger::init_cli_logger(log_level);
    }

    tracing::info!("Starting scanner-bridge");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if cli.list {
        let ports = list_ports().context("listing serial ports")?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            match port.usb {
                Some(usb) => println!(
                    "{}\tusb {:04x}:{:04x}\t{}",
                    port.path,
                    usb.vendor_id,
                    usb.product_id,
                    usb.product.unwrap_or_default()
                ),
                None => println!("{}", port.path),
            }
        }
        return Ok(());
    }

    let settings = match file_config
        .validate()
        .and_then(|_| Settings::resolve(&[&cli, &file_config]))
        .and_then(|settings| settings.validate().map(|_| settings))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Effective settings: {:?}", settings);

    let mut scanned_sinks: Vec<Box<dyn StateSink>> = vec![Box::new(
        ScanPrinter::new(std::io::stdout(), settings.format)
            .registration_ids(settings.registration_ids),
    )];
    if let Some(path) = &settings.csv_log {
        let log = CsvScanLog::open(path).with_context(|| format!("opening scan log {}", path))?;
        scanned_sinks.push(Box::new(log));
    }
    let scanned = FanoutSink::new(scanned_sinks);

    let connected = CallbackSink::new(|value: String| {
        match ConnectionState::from_slot(&value) {
            ConnectionState::Connected => tracing::info!("🔌 Scanner ready"),
            ConnectionState::Disconnected => tracing::info!("🔌 Scanner disconnected"),
        }
    });

    let result = match &settings.source {
        DeviceSource::Serial { path } => {
            run_until_interrupted(
                NativePortRequester::new(path.clone()),
                &settings,
                &connected,
                &scanned,
            )
            .await
        }
        DeviceSource::Replay { path } => {
            run_until_interrupted(
                ReplayPortRequester::new(path.clone()),
                &settings,
                &connected,
                &scanned,
            )
            .await
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Scanner bridge failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run_until_interrupted<R: PortRequester>(
    requester: R,
    settings: &Settings,
    connected: &dyn StateSink,
    scanned: &dyn StateSink,
) -> Result<(), BridgeError> {
    let bridge = ScannerBridge::new(requester).with_filters(settings.filters());

    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Interrupted, closing scanner"),
            Err(e) => {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    bridge.run_until(connected, scanned, interrupted).await
}
