use std::fs;

use docfix::Document;
use rewriter::{Mode, Recipe, RewriteError, apply, rewrite_file};

const STATUS_BLOCK: &str = "\
/**
 * @swagger
 * /api/orders/{id}/status:
 *   patch:
 *     tags: [Orders]
 *     summary: Update order status
 *     description: Admin only - Updates order status and creates history record
 *     requestBody:
 *       required: true
 *       content:
 *         application/json:
 *           schema:
 *             type: object
 *             required: [status]
 *             properties:
 *               status:
 *                 type: string
 *               notes: { type: string }
 *     responses:
 *       200:
 *         description: Order status updated successfully
 */
";

const CANCEL_BLOCK: &str = "\
/**
 * @swagger
 * /api/orders/{id}/cancel:
 *   patch:
 *     summary: Cancel order
 *     requestBody:
 *       content:
 *         application/json:
 *           schema:
 *             type: object
 *     responses:
 *       200:
 *         description: Order cancelled successfully
 */
";

const REWRITTEN_STATUS_BLOCK: &str = "\
/**
 * @swagger
 * /api/orders/{id}/status:
 *   patch:
 *     tags: [Orders]
 *     summary: Update order status
 *     description: Admin only - Updates order status and creates history record
 *     requestBody:
 *       required: true
 *       content:
 *         application/json:
 *           schema:
 *             $ref: '#/components/schemas/OrderStatusUpdate'
 *     responses:
 *       200:
 *         description: Order status updated successfully
 */
";

fn run(source: &str) -> String {
    apply(&Recipe::order_status(), &Document::parse(source))
        .expect("rewrite failed")
        .document
        .render()
}

#[test]
fn two_blocks_become_one() {
    let source = format!("{STATUS_BLOCK}\n{CANCEL_BLOCK}\n{STATUS_BLOCK}");
    let output = run(&source);
    assert_eq!(output.matches("summary: Update order status").count(), 1);
    assert!(output.starts_with(REWRITTEN_STATUS_BLOCK));
    assert!(output.contains(CANCEL_BLOCK));
}

#[test]
fn duplicate_removal_keeps_the_comment_opener() {
    // The duplicate starts at the marker line, so the lines above it in the
    // second comment stay behind.
    let source = format!("{STATUS_BLOCK}{STATUS_BLOCK}");
    let output = run(&source);
    let expected = format!(
        "{REWRITTEN_STATUS_BLOCK}/**\n * @swagger\n * /api/orders/{{id}}/status:\n *   patch:\n *     tags: [Orders]\n"
    );
    assert_eq!(output, expected);
}

#[test]
fn single_block_only_gets_the_schema_swap() {
    let source = format!("// header\n{STATUS_BLOCK}{CANCEL_BLOCK}");
    let output = run(&source);
    assert_eq!(output, format!("// header\n{REWRITTEN_STATUS_BLOCK}{CANCEL_BLOCK}"));
}

#[test]
fn no_marker_is_identity() {
    let source = format!("{CANCEL_BLOCK}\r\n// trailing without newline");
    assert_eq!(run(&source), source);
}

#[test]
fn rewriting_twice_equals_rewriting_once() {
    let source = format!("{STATUS_BLOCK}{CANCEL_BLOCK}{STATUS_BLOCK}");
    let once = run(&source);
    assert_eq!(run(&once), once);
}

#[test]
fn crlf_is_preserved_on_inserted_lines() {
    let source = STATUS_BLOCK.replace('\n', "\r\n");
    let output = run(&source);
    assert_eq!(output, REWRITTEN_STATUS_BLOCK.replace('\n', "\r\n"));
}

#[test]
fn report_lists_removed_blocks() {
    let source = format!("{STATUS_BLOCK}{STATUS_BLOCK}");
    let rewrite = apply(&Recipe::order_status(), &Document::parse(&source)).unwrap();
    assert_eq!(rewrite.report.removed.len(), 1);
    assert_eq!(rewrite.report.removed[0].start, 27);
    assert_eq!(rewrite.report.removed[0].end, 43);
    assert_eq!(rewrite.report.rewritten, Some(5));
    assert!(rewrite.report.warnings.is_empty());
}

#[test]
fn block_without_request_body_warns() {
    let source = "/**\n * summary: Update order status\n * responses:\n */\n";
    let rewrite = apply(&Recipe::order_status(), &Document::parse(source)).unwrap();
    assert_eq!(rewrite.document.render(), source);
    assert_eq!(rewrite.report.rewritten, None);
    assert_eq!(rewrite.report.warnings.len(), 1);
    assert_eq!(rewrite.report.warnings[0].line, 1);
}

#[test]
fn unterminated_block_is_an_error() {
    let source = "/**\n * summary: Update order status\n * requestBody:\n";
    let err = apply(&Recipe::order_status(), &Document::parse(source)).unwrap_err();
    assert!(err.to_string().starts_with("unterminated block"));
    assert_eq!(err.as_splice().map(|e| e.line()), Some(1));
}

#[test]
fn request_body_without_responses_is_an_error() {
    let source = "/**\n * summary: Update order status\n * requestBody:\n *   old\n */\n * responses:\n";
    let err = apply(&Recipe::order_status(), &Document::parse(source)).unwrap_err();
    assert!(err.to_string().contains("`responses:`"));
}

#[test]
fn rewrite_file_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("openapi-annotations.js");
    fs::write(&path, format!("{STATUS_BLOCK}{STATUS_BLOCK}")).unwrap();

    let outcome = rewrite_file(&path, &Recipe::order_status(), Mode::Write).unwrap();
    assert!(outcome.changed);
    assert!(outcome.written);
    assert_eq!(fs::read_to_string(&path).unwrap(), outcome.output);

    let again = rewrite_file(&path, &Recipe::order_status(), Mode::Write).unwrap();
    assert!(!again.changed);
    assert!(!again.written);
}

#[test]
fn dry_run_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.js");
    fs::write(&path, STATUS_BLOCK).unwrap();

    let outcome = rewrite_file(&path, &Recipe::order_status(), Mode::DryRun).unwrap();
    assert!(outcome.changed);
    assert!(!outcome.written);
    assert_eq!(outcome.output, REWRITTEN_STATUS_BLOCK);
    assert_eq!(fs::read_to_string(&path).unwrap(), STATUS_BLOCK);
}

#[test]
fn failed_rewrite_does_not_touch_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.js");
    let source = format!("{STATUS_BLOCK}/**\n * summary: Update order status\n");
    fs::write(&path, &source).unwrap();

    let err = rewrite_file(&path, &Recipe::order_status(), Mode::Write).unwrap_err();
    assert!(matches!(err, RewriteError::Splice(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.js");
    let err = rewrite_file(&path, &Recipe::order_status(), Mode::Write).unwrap_err();
    assert!(matches!(err, RewriteError::Read { .. }));
    assert!(err.to_string().starts_with("cannot read '"));
}

#[test]
fn recipe_file_drives_a_different_block() {
    let dir = tempfile::tempdir().unwrap();
    let recipe_path = dir.path().join("cancel.toml");
    fs::write(
        &recipe_path,
        "marker = \"Cancel order\"\nreplacement = [\" *       $ref: '#/components/requestBodies/Cancel'\"]\n",
    )
    .unwrap();
    let recipe = Recipe::load(&recipe_path).unwrap();

    let output = apply(&recipe, &Document::parse(CANCEL_BLOCK))
        .unwrap()
        .document
        .render();
    assert!(output.contains(" *     requestBody:\n *       $ref: '#/components/requestBodies/Cancel'\n *     responses:\n"));
    assert!(!output.contains("type: object"));
}
