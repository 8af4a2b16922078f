// src/orchestrator.rs
//! ファイル単位の変換パイプライン: 読み込み → (CommonJS 正規化) → パース → マッチ → 書き換え → 出力。
//!
//! 失敗はすべて最も狭い単位 (ファイル / ルート) でスキップ記録に変換し、実行全体は止めない。

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::emitter::{emit, write_output, EmitOptions};
use crate::errors::TransformError;
use crate::matcher::find_routes;
use crate::model::{ConversionResult, SourceUnit};
use crate::parser::parse_unit;
use crate::review::{persist_review, ReviewConfig, Reviewer};
use crate::rewriter::{rewrite, ServerlessModule};

pub struct Transformer<'a> {
    options: EmitOptions,
    review: Option<(&'a dyn Reviewer, &'a ReviewConfig)>,
    /// この実行で書き込んだ出力パス。2 つの入力が同じパスに書かないようにする。
    written: RefCell<HashSet<PathBuf>>,
}

impl<'a> Transformer<'a> {
    pub fn new(options: EmitOptions) -> Self {
        Transformer {
            options,
            review: None,
            written: RefCell::new(HashSet::new()),
        }
    }

    /// 出力を書き込んだあとでレビューサービスを呼ぶようにする
    pub fn with_reviewer(mut self, reviewer: &'a dyn Reviewer, config: &'a ReviewConfig) -> Self {
        self.review = Some((reviewer, config));
        self
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// 列挙順にファイルを 1 つずつ変換し、結果を順序を保って集計する
    pub fn transform_all<I>(&self, files: I) -> ConversionResult
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut total = ConversionResult::default();
        for file in files {
            total.absorb(self.transform_file(&file));
        }
        total
    }

    /// 1 ファイルを変換する。一部のルートだけ変換できた場合もその結果を返す。
    pub fn transform_file(&self, path: &Path) -> ConversionResult {
        let mut result = ConversionResult::default();
        info!(file = %path.display(), "変換開始");

        let unit = match read_unit(path, &self.options.base) {
            Ok(unit) => unit,
            Err(e) => {
                record_skip(&mut result, path, e);
                return result;
            }
        };

        let tree = match parse_unit(&unit) {
            Ok(tree) => tree,
            Err(e) => {
                record_skip(&mut result, path, TransformError::from(e));
                return result;
            }
        };

        // 全体をトラバースし終えてから「ルートなし」を判定する
        let routes = find_routes(&tree);
        debug!(file = %path.display(), count = routes.len(), "ルート抽出完了");
        if routes.is_empty() {
            record_skip(&mut result, path, TransformError::NoRouteFound);
            return result;
        }

        let mut ordinal = 0;
        for route in &routes {
            let Some(module) = rewrite(route) else {
                record_skip(&mut result, path, TransformError::InvalidHandler);
                continue;
            };
            ordinal += 1;

            let output = self.options.output_path(&unit.route_id, ordinal);
            if !self.written.borrow_mut().insert(output.clone()) {
                record_skip(&mut result, path, TransformError::OutputCollision { path: output });
                continue;
            }
            match emit_to(&module, &output) {
                Ok(text) => {
                    info!(
                        method = %module.method,
                        path = route.route_path.as_deref().unwrap_or("?"),
                        output = %output.display(),
                        "サーバーレス関数を出力"
                    );
                    result.converted += 1;
                    self.run_review(&unit, &text, &output);
                    result.outputs.push(output);
                }
                Err(e) => record_skip(&mut result, path, e),
            }
        }

        result
    }

    /// レビューの失敗はログに残すだけ。変換結果には影響しない。
    fn run_review(&self, unit: &SourceUnit, after: &str, output: &Path) {
        let Some((reviewer, config)) = self.review else {
            return;
        };

        let feedback = match reviewer.review(&unit.text, after, config) {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(file = %unit.path.display(), error = %e, "レビューに失敗");
                return;
            }
        };

        if config.persist {
            match persist_review(output, &feedback) {
                Ok(path) => debug!(review = %path.display(), "レビューを保存"),
                Err(e) => warn!(error = %e, "レビューの保存に失敗"),
            }
        } else {
            info!(output = %output.display(), feedback = %feedback, "レビュー結果");
        }
    }
}

/// オプションだけで 1 ファイルを変換する
pub fn transform_file(path: &Path, options: &EmitOptions) -> ConversionResult {
    Transformer::new(options.clone()).transform_file(path)
}

fn read_unit(path: &Path, base: &Path) -> Result<SourceUnit, TransformError> {
    let text = fs::read_to_string(path).map_err(TransformError::Read)?;
    Ok(SourceUnit::new(path.to_path_buf(), text, base))
}

fn emit_to(module: &ServerlessModule, output: &Path) -> Result<String, TransformError> {
    let text = emit(module).map_err(TransformError::Emit)?;
    write_output(output, &text)?;
    Ok(text)
}

fn record_skip(result: &mut ConversionResult, path: &Path, reason: TransformError) {
    warn!(file = %path.display(), reason = %reason, "スキップ");
    result.skip(path, reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReviewError;
    use crate::platform::TargetPlatform;

    struct FakeReviewer {
        fail: bool,
        calls: RefCell<Vec<String>>,
    }

    impl Reviewer for FakeReviewer {
        fn review(&self, _before: &str, after: &str, config: &ReviewConfig) -> Result<String, ReviewError> {
            self.calls.borrow_mut().push(after.to_string());
            if self.fail {
                return Err(ReviewError::MissingCredential {
                    provider: config.provider.clone(),
                });
            }
            Ok("looks fine".to_string())
        }
    }

    fn options(dir: &Path) -> EmitOptions {
        let mut opts = EmitOptions::new(TargetPlatform::Netlify, dir);
        opts.out_root = dir.join("out");
        opts
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missingRoutes.js");
        let result = transform_file(&missing, &options(dir.path()));
        assert_eq!(result.converted, 0);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.starts_with("Read failed"));
    }

    #[test]
    fn parse_failure_is_a_single_skip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("brokenRoutes.js");
        fs::write(&file, "app.get('/x', (req, res) => {\n").unwrap();
        let result = transform_file(&file, &options(dir.path()));
        assert_eq!(result.converted, 0);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.starts_with("Parse error"));
    }

    #[test]
    fn second_route_in_a_file_gets_ordinal_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("userRoutes.js");
        fs::write(
            &file,
            "app.get('/a', (req, res) => { res.send('a'); });\napp.post('/b', (req, res) => { res.send('b'); });\n",
        )
        .unwrap();
        let result = transform_file(&file, &options(dir.path()));
        assert_eq!(result.converted, 2);
        assert_eq!(
            result.outputs,
            vec![
                dir.path().join("out/userRoutes.js"),
                dir.path().join("out/userRoutes-2.js")
            ]
        );
    }

    #[test]
    fn colliding_output_path_is_skipped_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("userRoutes.js");
        let second = dir.path().join("userRoutes-2.js");
        fs::write(
            &first,
            "app.get('/a', (req, res) => { res.send('a'); });\napp.post('/b', (req, res) => { res.send('b'); });\n",
        )
        .unwrap();
        fs::write(&second, "app.put('/c', (req, res) => { res.send('c'); });\n").unwrap();

        let result = Transformer::new(options(dir.path())).transform_all(vec![first, second.clone()]);
        assert_eq!(result.converted, 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].file, second);
        assert!(result.skipped[0].reason.starts_with("Output path already written"));

        let kept = fs::read_to_string(dir.path().join("out/userRoutes-2.js")).unwrap();
        assert!(kept.contains("req.method === \"POST\""));
    }

    #[test]
    fn review_feedback_is_persisted_next_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("helloRoutes.js");
        fs::write(&file, "app.get('/hello', (req, res) => { res.send('hi'); });\n").unwrap();

        let reviewer = FakeReviewer {
            fail: false,
            calls: RefCell::new(vec![]),
        };
        let config = ReviewConfig::default();
        let result = Transformer::new(options(dir.path()))
            .with_reviewer(&reviewer, &config)
            .transform_file(&file);

        assert_eq!(result.converted, 1);
        assert_eq!(reviewer.calls.borrow().len(), 1);
        let review = fs::read_to_string(dir.path().join("out/helloRoutes.review.md")).unwrap();
        assert_eq!(review, "looks fine");
    }

    #[test]
    fn review_failure_does_not_become_a_skip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("helloRoutes.js");
        fs::write(&file, "app.get('/hello', (req, res) => { res.send('hi'); });\n").unwrap();

        let reviewer = FakeReviewer {
            fail: true,
            calls: RefCell::new(vec![]),
        };
        let config = ReviewConfig::default();
        let result = Transformer::new(options(dir.path()))
            .with_reviewer(&reviewer, &config)
            .transform_file(&file);

        assert_eq!(result.converted, 1);
        assert!(result.skipped.is_empty());
        assert!(dir.path().join("out/helloRoutes.js").is_file());
        assert!(!dir.path().join("out/helloRoutes.review.md").exists());
    }
}
