// src/model.rs
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use swc_ecma_ast::BlockStmt;

/// ソースファイルのモジュール記法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStyle {
    /// `require(...)` / `module.exports = ...`
    CommonJs,
    /// `import` / `export`
    EsModule,
}

/// 読み込んだ 1 入力ファイル。読み込み後は変更しない。
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// 入力ファイルの絶対パス
    pub path: PathBuf,
    pub text: String,
    pub style: ModuleStyle,
    /// 出力ファイル名のもとになる識別子 (例: "routes/userRoutes")
    pub route_id: String,
}

impl SourceUnit {
    pub fn new(path: PathBuf, text: String, base: &Path) -> Self {
        let style = ModuleStyle::detect(&text);
        let route_id = route_identifier(&path, base);
        SourceUnit {
            path,
            text,
            style,
            route_id,
        }
    }
}

impl ModuleStyle {
    pub fn detect(text: &str) -> Self {
        if text.contains("require(") || text.contains("module.exports") {
            ModuleStyle::CommonJs
        } else {
            ModuleStyle::EsModule
        }
    }
}

/// `base` からの相対パスから拡張子を落とし、区切りを `/` にそろえたもの。
/// `base` の外にあるファイルはルート / プレフィックスを除いたパスを使う。
pub fn route_identifier(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let stemmed = relative.with_extension("");

    stemmed
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// 対象とする HTTP メソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// `app.get` の `get` のようなプロパティ名から変換する。小文字のみ受け付ける。
    pub fn from_property(name: &str) -> Option<Self> {
        match name {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ルート登録呼び出しのレシーバ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    App,
    Router,
}

impl Receiver {
    pub fn from_ident(name: &str) -> Option<Self> {
        match name {
            "app" => Some(Receiver::App),
            "router" => Some(Receiver::Router),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Receiver::App => "app",
            Receiver::Router => "router",
        }
    }
}

/// ハンドラ関数から取り出した本体と修飾子
#[derive(Debug, Clone)]
pub struct Handler {
    pub body: BlockStmt,
    pub is_async: bool,
    pub is_generator: bool,
}

/// 構文木の中で見つかった 1 つのルート登録呼び出し
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub method: HttpMethod,
    pub receiver: Receiver,
    /// 第 1 引数が文字列リテラルならそのパス (ログ用)
    pub route_path: Option<String>,
    /// 最後の引数から取り出したハンドラ。取り出せなければ `None` (無効なマッチ)
    pub handler: Option<Handler>,
}

impl RouteMatch {
    pub fn is_valid(&self) -> bool {
        self.handler.is_some()
    }
}

/// スキップ記録 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub file: PathBuf,
    pub reason: String,
}

impl SkipRecord {
    pub fn new(file: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        SkipRecord {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

/// 1 ファイル (または実行全体) の変換結果。変換とスキップは共存しうる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub converted: usize,
    pub skipped: Vec<SkipRecord>,
    /// 書き出したファイル (出力順)
    pub outputs: Vec<PathBuf>,
}

impl ConversionResult {
    pub fn skip(&mut self, file: &Path, reason: impl fmt::Display) {
        self.skipped.push(SkipRecord::new(file, reason));
    }

    /// 別ファイルの結果を順序を保ったまま取り込む
    pub fn absorb(&mut self, other: ConversionResult) {
        self.converted += other.converted;
        self.skipped.extend(other.skipped);
        self.outputs.extend(other.outputs);
    }
}
