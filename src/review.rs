// src/review.rs
//! 変換前後のコードを外部のレビューサービスに渡すための境界。
//!
//! HTTP 経由の実装は `provider::HttpReviewer`。テストでは任意の `Reviewer` を差し込める。

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ReviewError;

/// レビュー設定 (`servmini.toml` の `[review]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// プロバイダ既定のエンドポイントを上書きする (ローカルの Ollama など)
    pub base_url: Option<String>,
    pub prompt_template: Option<String>,
    /// 結果を `<出力パス>.review.md` に保存するか
    pub persist: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            enabled: false,
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            prompt_template: None,
            persist: true,
        }
    }
}

/// レビューサービス
pub trait Reviewer {
    fn review(&self, before: &str, after: &str, config: &ReviewConfig) -> Result<String, ReviewError>;
}

/// プロバイダに渡すプロンプトを組み立てる
pub fn build_prompt(before: &str, after: &str, config: &ReviewConfig) -> String {
    let intro = config.prompt_template.as_deref().unwrap_or(
        "You are a senior developer reviewing a Node.js Express route being converted into a serverless function.\n\
         Give clear, actionable feedback. Mention anything missing or that could break in production.",
    );
    format!("{intro}\n\n--- BEFORE ---\n{before}\n\n--- AFTER ---\n{after}\n")
}

/// `output/api/users.js` → `output/api/users.review.md`
pub fn review_path(output: &Path) -> PathBuf {
    output.with_extension("review.md")
}

/// レビュー結果をそのまま保存する
pub fn persist_review(output: &Path, feedback: &str) -> Result<PathBuf, ReviewError> {
    let path = review_path(output);
    fs::write(&path, feedback).map_err(|source| ReviewError::Persist {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
