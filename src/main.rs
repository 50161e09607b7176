use clap::Parser;
use workbook_degradations::utils::logger;
use workbook_degradations::{app, CliConfig, Password};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 驗證配置（在任何網路呼叫之前）
    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let password = match rpassword::prompt_password("Password: ") {
        Ok(password) => Password::new(password),
        Err(e) => {
            eprintln!("❌ Could not read password: {}", e);
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(settings.logging_level);
    tracing::debug!("Settings: {:?}", settings);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = app::run(&settings, password, &mut out).await {
        tracing::error!("❌ Fetching degradations failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(e.exit_code());
    }
}
