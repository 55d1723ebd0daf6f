use anyhow::Context;
use clap::Parser;
use photo_report_common::{ReportConfig, StatusSink};
use photo_report_rust::{cli, config, pipeline, scanner, status};
use cli::{Cli, Commands, Overrides};
use config::Config;
use pipeline::ReportRequest;
use scanner::{DecodeValidator, FsLister};
use status::JsonLinesSink;
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> photo_report_rust::error::Result<ReportConfig> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn read_stdin_request() -> anyhow::Result<ReportRequest> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("標準入力を読み込めません")?;
    serde_json::from_str(&input).context("依頼JSONの形式が不正です")
}

fn run_report(request: ReportRequest, config: anyhow::Result<ReportConfig>, sink: &mut dyn StatusSink) -> ExitCode {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            sink.result(format!("設定を読み込めません: {:#}", e), false, None);
            return ExitCode::FAILURE;
        }
    };

    if pipeline::run(&request, &config, &FsLister, &DecodeValidator, sink) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut sink = JsonLinesSink::stdout();
    let config = load_config(&cli).map_err(anyhow::Error::from);

    match cli.command {
        Commands::Run { measurement, sheet, photos, template, target_count, min_photos, skip_validation } => {
            let request = ReportRequest {
                measurement_path: measurement,
                sheet_name: sheet,
                photos_dir: photos,
                template_path: template,
            };
            let overrides = Overrides { target_count, min_photos, skip_validation };
            let config = config.map(|mut c| {
                overrides.apply(&mut c);
                c
            });
            run_report(request, config, &mut sink)
        }

        Commands::Stdin => match read_stdin_request() {
            Ok(request) => run_report(request, config, &mut sink),
            Err(e) => {
                let sink: &mut dyn StatusSink = &mut sink;
                sink.result(format!("実行時に処理されない例外が発生しました: {:#}", e), false, None);
                ExitCode::FAILURE
            }
        },

        Commands::Config { show, init } => {
            let config = match config {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("設定エラー: {:#}", e);
                    return ExitCode::FAILURE;
                }
            };

            if init {
                match Config::save(&ReportConfig::default()) {
                    Ok(path) => println!("✔ 既定の設定を書き出しました: {}", path.display()),
                    Err(e) => {
                        eprintln!("設定の保存に失敗: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }

            if show || !init {
                match serde_json::to_string_pretty(&config) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("設定の表示に失敗: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }

            ExitCode::SUCCESS
        }
    }
}
