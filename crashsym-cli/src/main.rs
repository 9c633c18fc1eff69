//! crashsym CLI - コマンドラインインターフェース
//!
//! バイナリ形式のクラッシュレポートを読み込み、クラッシュしたスレッドを
//! シンボル化して標準出力に表示します。ログは標準エラー出力に出ます。

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use crashsym_core::{AnalyzeFailure, Analyzer};
use crashsym_report::decode_report;
use crashsym_tools::{AtosSymbolizer, MachOProbe, MdfindSearch, SystemRunner};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// crashsym - Crash report symbolicator
#[derive(Parser)]
#[command(name = "crashsym")]
#[command(version = "0.1.0")]
#[command(about = "Symbolicates binary crash reports using local debug symbols", long_about = None)]
struct Cli {
    /// Path to the binary crash report
    report: PathBuf,

    /// Local application binary, dSYM bundle or xcarchive to use instead of searching by UUID
    image_path: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Err(write_err) = e.print() {
                eprintln!("Error: failed to print usage: {}", write_err);
            }
            return if is_usage_error(&e) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match classify_error(&e) {
                Failure::Warning(message) => print!("{}", message),
                Failure::Error(message) => eprintln!("{}", message),
            }
            ExitCode::FAILURE
        }
    }
}

/// --help と --version 以外の引数エラー
fn is_usage_error(e: &clap::Error) -> bool {
    !matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

/// 終了コード1で終わるときの表示
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    /// 解析の中断。確定していた冒頭部分に続けて標準出力に出す（改行を含む）
    Warning(String),
    /// 読み込みやデコードの失敗。標準エラー出力に出す
    Error(String),
}

fn classify_error(e: &anyhow::Error) -> Failure {
    match e.downcast_ref::<AnalyzeFailure>() {
        Some(failure) => Failure::Warning(format!(
            "{}Warning: {}\n",
            failure.preamble, failure.error
        )),
        None => Failure::Error(format!("Error: {:#}", e)),
    }
}

/// ログの初期化
///
/// `RUST_LOG` が設定されていればそちらを優先します。
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// レポートを読み込んで解析し、結果を表示する
fn run(cli: &Cli) -> Result<()> {
    let data = fs::read(&cli.report)
        .with_context(|| format!("failed to read crash report {}", cli.report.display()))?;
    debug!("read {} bytes from {:?}", data.len(), cli.report);

    let report = decode_report(&data)
        .with_context(|| format!("failed to decode crash report {}", cli.report.display()))?;
    info!(
        "{} thread(s), {} binary image(s)",
        report.threads.len(),
        report.binary_images.len()
    );

    let mut analyzer = Analyzer::new(
        MdfindSearch::new(SystemRunner),
        AtosSymbolizer::new(SystemRunner),
        MachOProbe,
    )?;
    let analysis = analyzer.analyze(&report, cli.image_path.as_deref())?;

    print!("{}", analysis);
    Ok(())
}
