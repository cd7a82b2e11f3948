//! xray — 컨테이너 이미지 취약점 스캔 오케스트레이터 CLI
//!
//! 이미지 목록을 인자, 쿠버네티스 네임스페이스, helm 차트, YAML
//! 매니페스트에서 수집해 외부 스캐너로 동시 스캔합니다. 결과 테이블은
//! stdout, 로그는 stderr로 나갑니다.

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // 결과 테이블이 stdout을 쓰므로 로그는 stderr로 보낸다
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let verbosity = cli.verbosity;
    match cli.command {
        Commands::Image(args) => commands::image::execute(args, verbosity).await,
        Commands::Namespace(args) => commands::namespace::execute(args, verbosity).await,
        Commands::Helm(args) => commands::helm::execute(args, verbosity).await,
        Commands::Yaml(args) => commands::yaml::execute(args, verbosity).await,
        Commands::Version => {
            commands::version::execute();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);

    if let Err(e) = run(cli).await {
        // 취소 전에 이미 렌더링된 부분 결과는 stdout에 그대로 남는다
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
