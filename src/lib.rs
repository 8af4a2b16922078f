// src/lib.rs
//! Express 形式のルートファイルを、サーバーレス向けの
//! `export default function handler(req, res)` モジュールに変換する。

pub mod config;
pub mod emitter;
pub mod errors;
pub mod matcher;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod platform;
pub mod provider;
pub mod review;
pub mod rewriter;
pub mod scanner;

pub use emitter::EmitOptions;
pub use errors::{ConfigError, ParseError, ReviewError, TransformError};
pub use model::{ConversionResult, HttpMethod, RouteMatch, SkipRecord, SourceUnit};
pub use orchestrator::{transform_file, Transformer};
pub use platform::TargetPlatform;
