// src/rewriter.rs
//! マッチしたルートハンドラを `export default function handler(req, res)` に書き換える。
//!
//! 生成するのはメソッドガードの `if` 文 1 つだけ。405 応答や import の持ち越しはしないので、
//! ハンドラが外側のスコープ (ミドルウェア、DB クライアントなど) を参照していれば
//! 出力では未解決のままになる。

use swc_common::DUMMY_SP;
use swc_ecma_ast::*;

use crate::model::{Handler, HttpMethod, RouteMatch};

/// 1 ルート分の生成結果
#[derive(Debug, Clone)]
pub struct ServerlessModule {
    pub method: HttpMethod,
    pub module: Module,
}

/// 有効な `RouteMatch` から `ServerlessModule` を組み立てる。本体のない無効なマッチは `None`。
pub fn rewrite(route: &RouteMatch) -> Option<ServerlessModule> {
    let handler = route.handler.clone()?;
    Some(build_module(route.method, handler))
}

/// `export default function handler(req, res) { if (req.method === "<METHOD>") <body> }`
///
/// 元のハンドラが `async` / generator なら生成する関数にも引き継ぐ
/// (本体の `await` / `yield` がそのまま有効になるように)。
pub fn build_module(method: HttpMethod, handler: Handler) -> ServerlessModule {
    let guard = Stmt::If(IfStmt {
        span: DUMMY_SP,
        test: Box::new(method_guard(method)),
        cons: Box::new(Stmt::Block(handler.body)),
        alt: None,
    });

    let function = Function {
        params: vec![param("req"), param("res")],
        decorators: vec![],
        span: DUMMY_SP,
        body: Some(BlockStmt {
            span: DUMMY_SP,
            stmts: vec![guard],
        }),
        is_generator: handler.is_generator,
        is_async: handler.is_async,
        type_params: None,
        return_type: None,
    };

    let export = ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
        span: DUMMY_SP,
        decl: DefaultDecl::Fn(FnExpr {
            ident: Some(ident("handler")),
            function: Box::new(function),
        }),
    });

    ServerlessModule {
        method,
        module: Module {
            span: DUMMY_SP,
            body: vec![ModuleItem::ModuleDecl(export)],
            shebang: None,
        },
    }
}

/// `req.method === "<METHOD>"`
fn method_guard(method: HttpMethod) -> Expr {
    Expr::Bin(BinExpr {
        span: DUMMY_SP,
        op: BinaryOp::EqEqEq,
        left: Box::new(Expr::Member(MemberExpr {
            span: DUMMY_SP,
            obj: Box::new(Expr::Ident(ident("req"))),
            prop: MemberProp::Ident(ident("method")),
        })),
        right: Box::new(Expr::Lit(Lit::Str(Str {
            span: DUMMY_SP,
            value: method.as_str().into(),
            raw: None,
        }))),
    })
}

fn ident(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP)
}

fn param(name: &str) -> Param {
    Param {
        span: DUMMY_SP,
        decorators: vec![],
        pat: Pat::Ident(BindingIdent {
            id: ident(name),
            type_ann: None,
        }),
    }
}
