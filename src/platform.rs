// src/platform.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::ConfigError;

/// 変換先のサーバーレスプラットフォーム
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetPlatform {
    #[default]
    Vercel,
    Netlify,
    Aws,
}

impl TargetPlatform {
    /// 出力ルート配下のベースディレクトリ。Vercel は `api/` 配下に置く。
    pub fn base_dir(self, out_root: &Path) -> PathBuf {
        match self {
            TargetPlatform::Vercel => out_root.join("api"),
            TargetPlatform::Netlify | TargetPlatform::Aws => out_root.to_path_buf(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetPlatform::Vercel => "vercel",
            TargetPlatform::Netlify => "netlify",
            TargetPlatform::Aws => "aws",
        }
    }
}

impl FromStr for TargetPlatform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vercel" => Ok(TargetPlatform::Vercel),
            "netlify" => Ok(TargetPlatform::Netlify),
            "aws" | "aws-lambda" => Ok(TargetPlatform::Aws),
            _ => Err(ConfigError::UnsupportedTarget(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetPlatform {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetPlatform> for String {
    fn from(value: TargetPlatform) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
