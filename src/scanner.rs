// src/scanner.rs
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::{DirEntry, WalkDir};

use crate::errors::ConfigError;

const SOURCE_EXTENSIONS: [&str; 3] = ["js", "ts", "tsx"];
const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

/// どのファイルを変換候補とみなすか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ScanPattern {
    /// ファイル名 (拡張子抜き) が `Routes` / `routes` で終わるもの
    #[default]
    Routes,
    /// `.js` / `.ts` / `.tsx` すべて
    All,
}

impl FromStr for ScanPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "routes" => Ok(ScanPattern::Routes),
            "all" => Ok(ScanPattern::All),
            _ => Err(ConfigError::UnsupportedPattern(s.to_string())),
        }
    }
}

impl TryFrom<String> for ScanPattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ScanPattern {
    pub fn accepts(self, path: &Path) -> bool {
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if !is_source {
            return false;
        }
        match self {
            ScanPattern::All => true,
            ScanPattern::Routes => path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.ends_with("Routes") || stem.ends_with("routes")),
        }
    }
}

fn is_skipped_dir(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let named = entry
        .file_name()
        .to_str()
        .is_some_and(|name| SKIPPED_DIRS.contains(&name));
    named || excluded.iter().any(|dir| dir == entry.path())
}

/// `root` 以下の候補ファイルを絶対パスでソートして返す。
/// `exclude` のディレクトリ (出力ルートなど) は中まで見ない。
pub fn scan_routes(root: &Path, pattern: ScanPattern, exclude: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let root = root.absolutize()?.to_path_buf();
    let excluded = exclude
        .iter()
        .map(|dir| dir.absolutize().map(|p| p.to_path_buf()))
        .collect::<io::Result<Vec<_>>>()?;

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e, &excluded))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && pattern.accepts(e.path()))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files.dedup();
    Ok(files)
}
