// src/main.rs

use clap::Parser;
use path_absolutize::Absolutize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use servmini::config::Config;
use servmini::provider::HttpReviewer;
use servmini::scanner::{scan_routes, ScanPattern};
use servmini::{ConversionResult, EmitOptions, TargetPlatform, Transformer};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "servmini",
    version,
    about = "Express のルートファイルをサーバーレス関数 (Vercel / Netlify / AWS) に変換する CLI ツール"
)]
struct Cli {
    /// 変換対象の Express プロジェクト
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// 変換先プラットフォーム (vercel / netlify / aws)
    #[arg(long, value_name = "PLATFORM")]
    target: Option<TargetPlatform>,

    /// 出力ファイルの拡張子
    #[arg(long, value_name = "EXT")]
    ext: Option<String>,

    /// 出力ファイルの拡張子を強制する (`--ext` より優先)
    #[arg(long = "force-ext", value_name = "EXT")]
    force_ext: Option<String>,

    /// 出力ルートディレクトリ (既定: output)
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// `*Routes` 以外の .js / .ts / .tsx もすべて対象にする
    #[arg(long)]
    all: bool,

    /// 設定ファイル (既定: ./servmini.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 変換結果を AI にレビューさせる (`[review].enabled` と同じ)
    #[arg(long)]
    review: bool,

    /// レビュープロバイダ (openai / openrouter / claude / fireworks / ollama)
    #[arg(long, value_name = "NAME")]
    provider: Option<String>,

    /// レビュープロバイダの API キー (未指定なら環境変数)
    #[arg(long = "api-key", value_name = "KEY")]
    api_key: Option<String>,

    /// 結果を JSON で出力する
    #[arg(long)]
    json: bool,

    /// デバッグログを有効にする
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("SERVMINI_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // 1) CLI 引数と設定ファイルを読み込む
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd, cli.config.as_deref())?;
    let input_dir = cli.input_dir.absolutize()?.to_path_buf();

    // 2) CLI フラグ > 設定ファイル > 既定値 の順で出力設定を決める
    let mut options = EmitOptions::new(cli.target.unwrap_or(config.transform.target), &cwd);
    options.out_root = cli.out_dir.unwrap_or(config.transform.out_dir);
    options.ext = cli.ext.or(config.transform.ext);
    options.force_ext = cli.force_ext;

    // 3) 候補ファイルを列挙 (ここでの失敗だけは実行全体を止める)
    let pattern = if cli.all {
        ScanPattern::All
    } else {
        config.transform.pattern
    };
    let out_root = options.out_root.absolutize()?.to_path_buf();
    let files = scan_routes(&input_dir, pattern, &[out_root])?;
    if files.is_empty() {
        eprintln!("Error: 変換対象のルートファイルが見つかりませんでした: {}", input_dir.display());
        return Ok(ExitCode::FAILURE);
    }

    let mut review = config.review;
    review.enabled |= cli.review;
    if let Some(provider) = cli.provider {
        review.provider = provider;
    }
    if cli.api_key.is_some() {
        review.api_key = cli.api_key;
    }

    // 4) 1 ファイルずつ順に変換 (レビューは各出力の直後に同期で行う)
    let reviewer = if review.enabled {
        match HttpReviewer::new() {
            Ok(reviewer) => {
                info!(provider = %review.provider, "AI レビューを有効化");
                Some(reviewer)
            }
            Err(e) => {
                warn!(error = %e, "レビュークライアントを初期化できないため、レビューは行いません");
                None
            }
        }
    } else {
        None
    };
    let transformer = match &reviewer {
        Some(reviewer) => Transformer::new(options).with_reviewer(reviewer, &review),
        None => Transformer::new(options),
    };
    let result = transformer.transform_all(files);

    // 5) 結果を出力 (スキップ理由は必ずすべて表示する)
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if result.converted == 0 && !result.skipped.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_summary(result: &ConversionResult) {
    println!("\nSummary:");
    println!("Converted: {}", result.converted);
    for output in &result.outputs {
        println!("  + {}", output.display());
    }
    println!("Skipped: {}", result.skipped.len());
    for skip in &result.skipped {
        println!("- {}: {}", skip.file.display(), skip.reason);
    }
}
