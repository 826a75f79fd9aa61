//! # Telemetry Router CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 事件路由与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_emit, run_info, run_router, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut obs = ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet, cli.log_format.into());
    obs.metrics_port = (cli.metrics_port != 0).then_some(cli.metrics_port);
    observability::init_with_config(obs)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry Router CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_router(args).await,
        Commands::Emit(args) => run_emit(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
