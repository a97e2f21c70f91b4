//! seedprobe 主入口

use anyhow::{Context, Result};
use seedprobe::{config::Config, infrastructure::logging, service::SeedScanner};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量
    dotenvy::dotenv().ok();

    // ✅ 2. 加载配置（CONFIG_PATH 或第一个命令行参数指定 TOML 文件）
    let config_path = std::env::var("CONFIG_PATH")
        .ok()
        .or_else(|| std::env::args().nth(1));
    let config = Config::from_env_and_file(config_path.as_deref())
        .context("Failed to load configuration")?;

    // ✅ 3. 初始化日志；guard 需存活到进程结束
    let _log_guard = match logging::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            logging::init_default_logging()
        }
    };

    // ✅ 4. 启动前校验：缺少任一网络的 API key 直接退出
    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        results = %config.scanner.results_path,
        mnemonic_log = %config.scanner.mnemonic_log_path,
        "🚀 Starting seedprobe"
    );

    // ✅ 5. 装配并运行扫描循环
    let mut scanner = SeedScanner::from_config(&config)?;
    let result = scanner.run().await;

    tracing::info!(
        "🎉 Balance found at {} after {} iteration(s): {}",
        result.address,
        scanner.iterations(),
        result
            .report
            .iter()
            .filter(|b| b.is_positive())
            .map(|b| b.display())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
