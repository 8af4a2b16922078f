// src/matcher.rs
use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};
use tracing::debug;

use crate::model::{Handler, HttpMethod, Receiver, RouteMatch};

/// 構文木をトラバースしてルート登録呼び出しを集める Visitor。
/// 呼び出し式以外のノードは素通りする。
struct RouteVisitor {
    pub matches: Vec<RouteMatch>,
}

impl Visit for RouteVisitor {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some(route) = classify_call(call) {
            debug!(
                receiver = route.receiver.as_str(),
                method = %route.method,
                path = route.route_path.as_deref().unwrap_or("?"),
                valid = route.is_valid(),
                "ルート登録呼び出し発見"
            );
            self.matches.push(route);
        }
        // 子ノードも訪問 (外側の呼び出しが先に記録される)
        call.visit_children_with(self);
    }
}

/// 構文木中のルート登録呼び出しをソース上の出現順に返す
pub fn find_routes(module: &Module) -> Vec<RouteMatch> {
    let mut visitor = RouteVisitor {
        matches: Vec::new(),
    };
    module.visit_with(&mut visitor);
    visitor.matches
}

/// `app.get(path, ...middleware, handler)` の形かどうかを判定する。
///
/// レシーバが `app` / `router`、メソッドが `get` / `post` / `put` / `delete`、
/// 引数が 2 つ以上ならマッチ。ハンドラ (最後の引数) から本体が取れない場合も
/// マッチとして返し、`handler` を `None` にする。
pub fn classify_call(call: &CallExpr) -> Option<RouteMatch> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(MemberExpr { obj, prop, .. }) = &**callee else {
        return None;
    };
    let Expr::Ident(obj_ident) = &**obj else {
        return None;
    };
    let MemberProp::Ident(prop_ident) = prop else {
        return None;
    };

    let receiver = Receiver::from_ident(&obj_ident.sym)?;
    let method = HttpMethod::from_property(&prop_ident.sym)?;
    if call.args.len() < 2 {
        return None;
    }

    let route_path = match &*call.args[0].expr {
        Expr::Lit(Lit::Str(Str { value, .. })) => Some(value.to_string()),
        _ => None,
    };
    let handler = call.args.last().and_then(extract_handler);

    Some(RouteMatch {
        method,
        receiver,
        route_path,
        handler,
    })
}

/// ハンドラ引数から関数本体と async / generator 指定を取り出す。
/// 式本体のアロー関数は 1 文のブロックに包む。
fn extract_handler(arg: &ExprOrSpread) -> Option<Handler> {
    if arg.spread.is_some() {
        return None;
    }
    match unwrap_parens(&arg.expr) {
        Expr::Arrow(arrow) => {
            let body = match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => block.clone(),
                BlockStmtOrExpr::Expr(expr) => BlockStmt {
                    span: expr.span(),
                    stmts: vec![Stmt::Expr(ExprStmt {
                        span: expr.span(),
                        expr: expr.clone(),
                    })],
                },
            };
            Some(Handler {
                body,
                is_async: arrow.is_async,
                is_generator: arrow.is_generator,
            })
        }
        Expr::Fn(FnExpr { function, .. }) => Some(Handler {
            body: function.body.clone()?,
            is_async: function.is_async,
            is_generator: function.is_generator,
        }),
        _ => None,
    }
}

fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(ParenExpr { expr, .. }) => unwrap_parens(expr),
        other => other,
    }
}
