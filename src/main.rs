use clap::Parser;
use random_basket::utils::error::ErrorSeverity;
use random_basket::utils::{logger, validation::Validate};
use random_basket::{app, CliArgs, LocalStorage, RunMode, RunStatus, TomlConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting random-basket");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(cycles) = args.max_cycles {
        config.purchase.max_cycles = Some(cycles);
        tracing::info!("🔧 max_cycles overridden to: {}", cycles);
    }

    if let Err(e) = args.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let mode = args.run_mode();
    if mode == RunMode::DryRun {
        tracing::info!("🔍 DRY RUN MODE - nothing will be recorded or put into the basket");
    }

    let storage = LocalStorage::new(".".to_string());
    let notifier = app::notifier_for(&config);

    match app::run(&config, mode, storage, &notifier).await {
        Ok(report) => {
            match report.status {
                RunStatus::TargetMet => println!(
                    "✅ Basket filled: {} items for {:.2}€",
                    report.order.len(),
                    report.order.total()
                ),
                RunStatus::CycleLimitReached => println!(
                    "⚠️  Gave up after {} pages: {} items for {:.2}€",
                    report.cycles,
                    report.order.len(),
                    report.order.total()
                ),
            }
        }
        Err(e) => {
            tracing::error!("❌ Run failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

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
    }

    Ok(())
}
