// src/emitter.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use swc_common::{sync::Lrc, SourceMap, Span, DUMMY_SP};
use swc_ecma_ast::Str;
use swc_ecma_codegen::{text_writer::JsWriter, Config as CodegenConfig, Emitter};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::errors::TransformError;
use crate::platform::TargetPlatform;
use crate::rewriter::ServerlessModule;

const DEFAULT_EXT: &str = "js";

/// 出力先と拡張子の決め方
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub target: TargetPlatform,
    /// 出力ルート (既定は `output`)
    pub out_root: PathBuf,
    /// ルート識別子を相対化する基準ディレクトリ (既定はカレントディレクトリ)
    pub base: PathBuf,
    /// `--ext` 相当
    pub ext: Option<String>,
    /// 強制拡張子。`ext` より優先する
    pub force_ext: Option<String>,
}

impl EmitOptions {
    pub fn new(target: TargetPlatform, base: impl Into<PathBuf>) -> Self {
        EmitOptions {
            target,
            out_root: PathBuf::from("output"),
            base: base.into(),
            ext: None,
            force_ext: None,
        }
    }

    /// 強制拡張子 → `ext` → `js` の順に決める。先頭の `.` は取り除く。
    pub fn extension(&self) -> String {
        [self.force_ext.as_deref(), self.ext.as_deref()]
            .into_iter()
            .flatten()
            .map(|e| e.trim_start_matches('.'))
            .find(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXT)
            .to_string()
    }

    pub fn base_dir(&self) -> PathBuf {
        self.target.base_dir(&self.out_root)
    }

    /// `<baseDir>/<routeId>.<ext>`。同じファイルの 2 つ目以降 (`ordinal` >= 2) は
    /// `<routeId>-<ordinal>.<ext>`。別の入力 (`<routeId>-2.js` など) と重なりうるので、
    /// 実行中の重複は `Transformer` 側で検出する。
    pub fn output_path(&self, route_id: &str, ordinal: usize) -> PathBuf {
        let name = if ordinal <= 1 {
            format!("{}.{}", route_id, self.extension())
        } else {
            format!("{}-{}.{}", route_id, ordinal, self.extension())
        };
        self.base_dir().join(name)
    }
}

/// 出力を入力の空白・クォートから独立させるための正規化。
/// span をすべて捨て、文字列リテラルの元表記 (`raw`) も捨てる。
struct Canonicalize;

impl VisitMut for Canonicalize {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = DUMMY_SP;
    }

    fn visit_mut_str(&mut self, s: &mut Str) {
        s.raw = None;
        s.visit_mut_children_with(self);
    }
}

/// `ServerlessModule` を整形済みのソーステキストにする。
/// 同じ木からは常に同じバイト列が出る。
pub fn emit(module: &ServerlessModule) -> io::Result<String> {
    let mut tree = module.module.clone();
    tree.visit_mut_with(&mut Canonicalize);

    let cm: Lrc<SourceMap> = Default::default();
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: CodegenConfig::default(),
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm, "\n", &mut buf, None),
        };
        emitter.emit_module(&tree)?;
    }

    let code = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(format!("{}\n", code.trim_end()))
}

/// 親ディレクトリを作ってから書き込む。ディレクトリ作成は冪等。
pub fn write_output(path: &Path, text: &str) -> Result<(), TransformError> {
    let wrap = |source| TransformError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, text).map_err(wrap)
}
