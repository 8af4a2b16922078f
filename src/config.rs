// src/config.rs
//! `servmini.toml` の読み込み。
//!
//! 優先順位は CLI フラグ > 設定ファイル > 既定値。CLI 側の上書きは `main.rs` で行う。

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::platform::TargetPlatform;
use crate::review::ReviewConfig;
use crate::scanner::ScanPattern;

pub const CONFIG_FILE: &str = "servmini.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transform: TransformConfig,
    pub review: ReviewConfig,
}

/// `[transform]` セクション
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub target: TargetPlatform,
    pub ext: Option<String>,
    pub out_dir: PathBuf,
    pub pattern: ScanPattern,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            target: TargetPlatform::Vercel,
            ext: None,
            out_dir: PathBuf::from("output"),
            pattern: ScanPattern::Routes,
        }
    }
}

impl Config {
    /// `explicit` が指定されていればそれを、なければ `dir/servmini.toml` を読む。
    /// 既定の場所にファイルがないのはエラーではない。
    pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = dir.join(CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&text, &path)
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }
}
