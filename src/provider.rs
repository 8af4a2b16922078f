// src/provider.rs
//! AI レビュープロバイダの HTTP 実装。
//!
//! OpenAI / OpenRouter / Claude (OpenRouter 経由) / Fireworks は OpenAI 互換の
//! `chat/completions`、Ollama は `/api/chat` を使う。呼び出しは同期で、
//! 変換ログとレビュー結果の順序が入れ替わらない。

use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ReviewError;
use crate::review::{build_prompt, ReviewConfig, Reviewer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    OpenRouter,
    Claude,
    Fireworks,
    Ollama,
}

impl FromStr for Provider {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "openrouter" => Ok(Provider::OpenRouter),
            "claude" => Ok(Provider::Claude),
            "fireworks" => Ok(Provider::Fireworks),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(ReviewError::Provider {
                provider: s.to_string(),
                message: "unknown AI provider".to_string(),
            }),
        }
    }
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Claude => "claude",
            Provider::Fireworks => "fireworks",
            Provider::Ollama => "ollama",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::OpenRouter | Provider::Claude => "https://openrouter.ai/api/v1",
            Provider::Fireworks => "https://api.fireworks.ai/inference/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::OpenRouter => "deepseek/deepseek-r1-0528:free",
            Provider::Claude => "anthropic/claude-3-sonnet",
            Provider::Fireworks => "accounts/fireworks/models/deepseek-v3",
            Provider::Ollama => "codellama",
        }
    }

    /// API キーを読む環境変数。Ollama はキー不要。
    fn key_env(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::OpenRouter | Provider::Claude => Some("OPENROUTER_API_KEY"),
            Provider::Fireworks => Some("FIREWORKS_API_KEY"),
            Provider::Ollama => None,
        }
    }

    pub fn endpoint(self, base_url: Option<&str>) -> String {
        let base = base_url.unwrap_or(self.default_base_url()).trim_end_matches('/');
        match self {
            Provider::Ollama => format!("{base}/api/chat"),
            _ => format!("{base}/chat/completions"),
        }
    }

    /// 設定のキー → 環境変数 の順に探す。必要なのに見つからなければエラー。
    pub fn resolve_api_key(
        self,
        config: &ReviewConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<String>, ReviewError> {
        let Some(var) = self.key_env() else {
            return Ok(None);
        };
        config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| env(var).filter(|k| !k.is_empty()))
            .map(Some)
            .ok_or_else(|| ReviewError::MissingCredential {
                provider: self.name().to_string(),
            })
    }

    pub fn request_body(self, model: &str, prompt: &str) -> Value {
        let messages = json!([{ "role": "user", "content": prompt }]);
        match self {
            Provider::Ollama => json!({ "model": model, "messages": messages, "stream": false }),
            _ => json!({ "model": model, "messages": messages }),
        }
    }

    /// 応答 JSON から本文を取り出して前後の空白を落とす
    pub fn parse_response(self, text: &str) -> Result<String, ReviewError> {
        let content = match self {
            Provider::Ollama => serde_json::from_str::<OllamaChat>(text).map(|r| r.message.content),
            _ => serde_json::from_str::<ChatCompletion>(text).map(|r| {
                r.choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .unwrap_or_default()
            }),
        }
        .map_err(|e| self.failure(format!("unexpected response: {e}")))?;

        Ok(content.trim().to_string())
    }

    fn failure(self, message: impl Into<String>) -> ReviewError {
        ReviewError::Provider {
            provider: self.name().to_string(),
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct OllamaChat {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// `ReviewConfig.provider` に応じて HTTP でレビューを依頼する
pub struct HttpReviewer {
    client: reqwest::blocking::Client,
}

impl HttpReviewer {
    pub fn new() -> Result<Self, ReviewError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReviewError::Provider {
                provider: "http".to_string(),
                message: e.to_string(),
            })?;
        Ok(HttpReviewer { client })
    }
}

impl Reviewer for HttpReviewer {
    fn review(&self, before: &str, after: &str, config: &ReviewConfig) -> Result<String, ReviewError> {
        let provider: Provider = config.provider.parse()?;
        let api_key = provider.resolve_api_key(config, |var| std::env::var(var).ok())?;
        let model = config.model.as_deref().unwrap_or(provider.default_model());
        let prompt = build_prompt(before, after, config);

        let mut request = self
            .client
            .post(provider.endpoint(config.base_url.as_deref()))
            .json(&provider.request_body(model, &prompt));
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        if matches!(provider, Provider::OpenRouter | Provider::Claude) {
            request = request.header("X-Title", "ServMini AI Reviewer");
        }

        let response = request
            .send()
            .map_err(|e| provider.failure(format!("request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| provider.failure(format!("failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(provider.failure(format!("HTTP {status}: {text}")));
        }

        provider.parse_response(&text)
    }
}
