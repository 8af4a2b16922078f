// src/parser.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use tracing::debug;

use crate::errors::ParseError;
use crate::model::{ModuleStyle, SourceUnit};

/// 1 ファイル分の構文木。そのファイルの処理が終われば捨てる。
pub type SyntaxTree = Module;

/// `const x = require("y");` / `const { a, b } = require("y");`
static REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)(?:const|let|var)\s+([A-Za-z_$][\w$]*|\{[^}]*\})\s*=\s*require\(\s*['"]([^'"]+)['"]\s*\)[ \t]*;?"#,
    )
    .expect("require pattern is valid")
});

/// `module.exports = ...`
static MODULE_EXPORTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)module\.exports\s*=\s*").expect("module.exports pattern is valid")
});

/// CommonJS 記法をテキストレベルで ESM 記法に書き換える (ベストエフォート)。
///
/// 分割代入のリネームや動的な `require` は対象外。変換しきれない形はそのまま残り、
/// パースに失敗すればスキップとして扱われる。
pub fn normalize_legacy_syntax(text: &str) -> Cow<'_, str> {
    let imports = REQUIRE_RE.replace_all(text, "${1}import ${2} from \"${3}\";");
    let exports = match MODULE_EXPORTS_RE.replace_all(&imports, "${1}export default ") {
        Cow::Borrowed(_) => None,
        Cow::Owned(s) => Some(s),
    };
    match exports {
        Some(s) => Cow::Owned(s),
        None => imports,
    }
}

/// TypeScript + JSX + デコレータをすべて有効にした構文設定。
/// 入力にどの構文が含まれるかは事前にわからないので、常にこの設定でパースする。
fn syntax() -> Syntax {
    Syntax::Typescript(TsConfig {
        tsx: true,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: false,
    })
}

/// ソーステキストを構文木にパースする
pub fn parse_source(text: &str, file_path: &Path) -> Result<SyntaxTree, ParseError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), text.to_string());

    let lexer = Lexer::new(
        syntax(),
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );
    let mut parser = SwcParser::new_from(lexer);

    let module = parser
        .parse_module()
        .map_err(|e| to_parse_error(text, fm.start_pos.0, e))?;

    // 回復可能なエラーも構文エラーとして扱う
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(to_parse_error(text, fm.start_pos.0, e));
    }

    debug!(file = %file_path.display(), items = module.body.len(), "パース成功");
    Ok(module)
}

/// `SourceUnit` を (必要なら CommonJS を正規化してから) パースする
pub fn parse_unit(unit: &SourceUnit) -> Result<SyntaxTree, ParseError> {
    match unit.style {
        ModuleStyle::CommonJs => {
            let normalized = normalize_legacy_syntax(&unit.text);
            debug!(file = %unit.path.display(), "CommonJS 記法を ESM に正規化");
            parse_source(&normalized, &unit.path)
        }
        ModuleStyle::EsModule => parse_source(&unit.text, &unit.path),
    }
}

fn to_parse_error(text: &str, start_pos: u32, err: swc_ecma_parser::error::Error) -> ParseError {
    let offset = err.span().lo.0.saturating_sub(start_pos) as usize;
    let (line, column) = line_column(text, offset);
    ParseError {
        message: err.kind().msg().into_owned(),
        line,
        column,
    }
}

/// バイトオフセットを 1 始まりの (行, 列) に変換する
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let before = &text[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
