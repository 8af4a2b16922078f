// src/errors.rs
//! 変換パイプラインのエラー定義。
//!
//! ファイル単位・ルート単位のエラーはすべて `TransformError` に集約され、
//! オーケストレータで `SkipRecord` に変換される。実行全体を止めるものはない。

use std::path::PathBuf;

/// ソースのパースに失敗した (構文エラー)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error: {message} ({line}:{column})")]
pub struct ParseError {
    pub message: String,
    /// 1 始まり
    pub line: usize,
    /// 1 始まり
    pub column: usize,
}

/// 1 ファイル、または 1 ルートの変換失敗。`Display` がそのままスキップ理由になる。
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No route handlers found")]
    NoRouteFound,

    #[error("Invalid handler (no body)")]
    InvalidHandler,

    #[error("Emit failed: {0}")]
    Emit(#[source] std::io::Error),

    #[error("Output path already written in this run: {}", .path.display())]
    OutputCollision { path: PathBuf },

    #[error("Write failed for {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// レビューサービスの失敗。ログに出すだけでスキップにはしない。
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Missing API key for provider '{provider}'")]
    MissingCredential { provider: String },

    #[error("Review provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Failed to persist review to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 設定ファイル / CLI 値の誤り
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {}: {message}", .path.display())]
    Toml { path: PathBuf, message: String },

    #[error("Unsupported target platform: {0}")]
    UnsupportedTarget(String),

    #[error("Unsupported scan pattern: {0}")]
    UnsupportedPattern(String),
}
