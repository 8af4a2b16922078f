// tests/transform.rs
use std::fs;
use std::path::{Path, PathBuf};

use servmini::{transform_file, EmitOptions, SkipRecord, TargetPlatform, Transformer};
use tempfile::TempDir;

fn setup() -> (TempDir, EmitOptions) {
    let dir = tempfile::tempdir().unwrap();
    let mut options = EmitOptions::new(TargetPlatform::Vercel, dir.path());
    options.out_root = dir.path().join("output");
    (dir, options)
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

fn trimmed_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

#[test]
fn scenario_a_esm_get_route() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "routes/helloRoutes.js",
        r#"import express from "express";
const app = express();

app.get("/hello", (req,res)=>{ res.send("Hello"); })
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 1);
    assert!(result.skipped.is_empty());

    let output = dir.path().join("output/api/routes/helloRoutes.js");
    assert_eq!(result.outputs, vec![output.clone()]);
    let text = fs::read_to_string(output).unwrap();
    assert_eq!(
        trimmed_lines(&text),
        vec![
            "export default function handler(req, res) {",
            "if (req.method === \"GET\") {",
            "res.send(\"Hello\");",
            "}",
            "}",
        ]
    );
}

#[test]
fn scenario_b_commonjs_post_route() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "submitRoutes.js",
        r#"const express = require("express");
const app = express();

app.post("/submit", (req, res) => {
  const data = req.body;
  res.status(201).json({ message: "Data received", data });
});

module.exports = app;
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 1);
    assert!(result.skipped.is_empty());

    let text = fs::read_to_string(dir.path().join("output/api/submitRoutes.js")).unwrap();
    let lines = trimmed_lines(&text);
    assert_eq!(lines[0], "export default function handler(req, res) {");
    assert_eq!(lines[1], "if (req.method === \"POST\") {");
    assert_eq!(lines[2], "const data = req.body;");
    assert!(text.contains("res.status(201).json({"));
    assert!(!text.contains("require("));
    assert!(!text.contains("import "));
}

#[test]
fn scenario_c_no_routes() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "utilRoutes.js",
        "export function add(a, b) {\n  return a + b;\n}\n",
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 0);
    assert_eq!(
        result.skipped,
        vec![SkipRecord::new(&file, "No route handlers found")]
    );
    assert!(!dir.path().join("output").exists());
}

#[test]
fn scenario_d_partial_success() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "userRoutes.ts",
        r#"import { Router } from "express";
import { listUsers } from "./controllers";

const router = Router();

router.get("/users", listUsers);
router.post("/users", async (req: any, res: any) => {
  res.status(201).end();
});

export default router;
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 1);
    assert_eq!(
        result.skipped,
        vec![SkipRecord::new(&file, "Invalid handler (no body)")]
    );

    let text = fs::read_to_string(dir.path().join("output/api/userRoutes.js")).unwrap();
    assert!(text.contains("req.method === \"POST\""));
}

#[test]
fn middleware_before_handler_is_dropped() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "adminRoutes.js",
        r#"app.delete("/item/:id", requireAuth, (req, res) => res.sendStatus(204));"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 1);

    let text = fs::read_to_string(dir.path().join("output/api/adminRoutes.js")).unwrap();
    assert!(text.contains("req.method === \"DELETE\""));
    assert!(text.contains("res.sendStatus(204);"));
    assert!(!text.contains("requireAuth"));
}

#[test]
fn emitted_and_skipped_counts_follow_matches() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "mixedRoutes.js",
        r#"app.get("/a", (req, res) => { res.send("a"); });
app.put("/b", handlerB);
router.delete("/c", function (req, res) { res.end(); });
app.post("/d", ...handlers);
app.listen(3000);
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 2);
    assert_eq!(result.skipped.len(), 2);
    assert!(result
        .skipped
        .iter()
        .all(|s| s.reason == "Invalid handler (no body)"));
    assert_eq!(
        result.outputs,
        vec![
            dir.path().join("output/api/mixedRoutes.js"),
            dir.path().join("output/api/mixedRoutes-2.js"),
        ]
    );
}

#[test]
fn output_is_byte_identical_across_runs() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "echoRoutes.js",
        "app.get('/echo', (req, res) => {\n    res.json({ q: req.query, n: [1, 2, 3] })\n})\n",
    );

    let first = transform_file(&file, &options);
    let first_text = fs::read(&first.outputs[0]).unwrap();

    let mut second_options = options.clone();
    second_options.out_root = dir.path().join("again");
    let second = transform_file(&file, &second_options);
    let second_text = fs::read(&second.outputs[0]).unwrap();

    assert_eq!(first_text, second_text);
}

#[test]
fn run_aggregates_in_enumeration_order() {
    let (dir, mut options) = setup();
    options.target = TargetPlatform::Netlify;
    options.force_ext = Some(".mjs".into());

    let files = vec![
        write(dir.path(), "aRoutes.js", "const x = 1;\n"),
        write(dir.path(), "bRoutes.js", "app.get('/b', (req, res) => { res.end(); });\n"),
        write(dir.path(), "cRoutes.js", "app.get('/c', (req, res) => {\n"),
        write(dir.path(), "dRoutes.js", "app.post('/d', handleD);\n"),
    ];

    let result = Transformer::new(options).transform_all(files.clone());
    assert_eq!(result.converted, 1);
    assert_eq!(result.outputs, vec![dir.path().join("output/bRoutes.mjs")]);

    let skipped_files: Vec<_> = result.skipped.iter().map(|s| s.file.clone()).collect();
    assert_eq!(
        skipped_files,
        vec![files[0].clone(), files[2].clone(), files[3].clone()]
    );
    assert_eq!(result.skipped[0].reason, "No route handlers found");
    assert!(result.skipped[1].reason.starts_with("Parse error"));
    assert_eq!(result.skipped[2].reason, "Invalid handler (no body)");
}

#[test]
fn express_server_with_two_routes() {
    let (dir, options) = setup();
    let file = write(
        dir.path(),
        "server.js",
        r#"import express from "express";
const app = express();

app.get("/hello", (req, res) => {
  res.send("Hello from Express!");
});

app.post("/submit", (req, res) => {
  const data = req.body;
  res.status(201).json({ message: "Data received", data });
});

app.listen(3000);
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 2);
    assert!(result.skipped.is_empty());

    let get = fs::read_to_string(&result.outputs[0]).unwrap();
    let post = fs::read_to_string(&result.outputs[1]).unwrap();
    assert!(get.contains("req.method === \"GET\""));
    assert!(post.contains("req.method === \"POST\""));
    assert!(!get.contains("listen"));
}

#[test]
fn destructured_rename_require_fails_as_a_single_parse_skip() {
    let (dir, options) = setup();
    // `{ a: b }` はそのまま import 指定子に移され、ESM としては不正になる
    let file = write(
        dir.path(),
        "renameRoutes.js",
        r#"const { Router: makeRouter } = require("express");
const router = makeRouter();
router.get("/r", (req, res) => { res.send("r"); });
"#,
    );

    let result = transform_file(&file, &options);
    assert_eq!(result.converted, 0);
    assert_eq!(result.skipped.len(), 1);
    assert!(result.skipped[0].reason.starts_with("Parse error"));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn computed_require_is_left_alone() {
    let (dir, options) = setup();
    let lonely = write(
        dir.path(),
        "dynamicRoutes.js",
        "const name = \"./db\";\nconst db = require(name);\nmodule.exports = db;\n",
    );
    let routed = write(
        dir.path(),
        "storeRoutes.js",
        "const db = require(process.env.DB_MODULE);\napp.get('/items', (req, res) => { res.json(db.all()); });\n",
    );

    let result = Transformer::new(options).transform_all(vec![lonely.clone(), routed]);
    assert_eq!(result.converted, 1);
    assert_eq!(
        result.skipped,
        vec![SkipRecord::new(&lonely, "No route handlers found")]
    );

    let out = fs::read_to_string(dir.path().join("output/api/storeRoutes.js")).unwrap();
    assert!(out.contains("res.json(db.all());"));
    assert!(!out.contains("require("));
}
