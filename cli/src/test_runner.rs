use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use docfix::Document;
use rewriter::{Recipe, Warning};

const FIXTURE_SUFFIX: &str = ".fixture";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Text the warning message must include.
    pub contains: String,

    /// If set, the warning must point at this 1-based input line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Shown instead of the file name in the PASS/FAIL listing.
    #[serde(default)]
    pub description: Option<String>,

    /// Recipe overrides. Omitted fields keep the order-status values.
    #[serde(default)]
    pub recipe: Option<Recipe>,

    /// Expected exact output text.
    #[serde(default)]
    pub expect_output: Option<String>,

    /// If true, the output must equal the input byte for byte.
    #[serde(default)]
    pub expect_unchanged: bool,

    /// Expected number of removed duplicate blocks.
    #[serde(default)]
    pub expect_removed: Option<usize>,

    /// Expected error: the error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// When set, the warnings must match one for one (`[]` means none).
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// A fixture opens with a `---` line, then TOML config up to the next `---`
/// line; everything after that is the input document, byte for byte.
fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let first = content.split_inclusive('\n').next().unwrap_or_default();
    if first.trim_end() != "---" {
        return Err("fixture must start with a `---` line".into());
    }
    let body = &content[first.len()..];

    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let config: FixtureConfig = toml::from_str(&body[..offset])
                .map_err(|e| format!("TOML parse error: {}", e))?;
            return Ok((config, &body[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err("no closing `---` line after the config".into())
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    // 2. Parse frontmatter
    let (config, input) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();

    // 3. Resolve the recipe
    let recipe = config.recipe.clone().unwrap_or_default();
    if let Err(e) = recipe.validate() {
        return fail(description, e.to_string());
    }

    // 4. Rewrite
    let result = rewriter::apply(&recipe, &Document::parse(input));

    // 5. Check error/output expectations
    let rewrite = match (&config.expect_error, result) {
        (Some(expected_err), Err(err)) => {
            let err_str = err.to_string();
            if err_str.contains(expected_err.as_str()) {
                return TestResult {
                    path: path.to_path_buf(),
                    description,
                    outcome: TestOutcome::Pass,
                };
            }
            return fail(
                description,
                format!("expected error containing \"{}\", got: {}", expected_err, err_str),
            );
        }
        (Some(expected_err), Ok(_)) => {
            return fail(
                description,
                format!(
                    "expected error containing \"{}\", but the rewrite succeeded",
                    expected_err
                ),
            );
        }
        (None, Err(err)) => return fail(description, format!("unexpected error: {}", err)),
        (None, Ok(rewrite)) => rewrite,
    };

    let output = rewrite.document.render();

    if config.expect_unchanged && output != input {
        return fail(
            description,
            format!("expected input unchanged, got:\n{}", output),
        );
    }

    if let Some(expected_output) = &config.expect_output {
        if &output != expected_output {
            return fail(
                description,
                format!(
                    "output mismatch\n  expected:\n{}\n  actual:\n{}",
                    expected_output, output
                ),
            );
        }
    }

    if let Some(expected_removed) = config.expect_removed {
        let removed = rewrite.report.removed.len();
        if removed != expected_removed {
            return fail(
                description,
                format!(
                    "expected {} removed block(s), got {}",
                    expected_removed, removed
                ),
            );
        }
    }

    // 6. Check warning expectations
    if let Some(expected_warnings) = &config.expect_warnings {
        if let Some(reason) = check_warnings(&rewrite.report.warnings, expected_warnings) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(actual: &[Warning], expected: &[ExpectedWarning]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual
            .iter()
            .map(|w| format!("  - {}", w.message))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = actual.line + 1;
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but it is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// `.fixture` files under `root`, keyed by their directory relative to
/// `root` ("" for files directly inside it). Both levels come out sorted.
fn discover_fixtures(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_fixture(&path) {
                found.entry(category_of(&path, root)).or_default().push(path);
            }
        }
    }
    found.values_mut().for_each(|files| files.sort());
    found
}

fn is_fixture(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX))
}

fn category_of(path: &Path, root: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    let fixtures = discover_fixtures(path);
    if fixtures.is_empty() {
        eprintln!("no {} files under {}", FIXTURE_SUFFIX, path.display());
        return;
    }
    for (category, files) in &fixtures {
        eprintln!("{:<24} {} fixture(s)", category_label(category), files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

fn label_for(result: &TestResult) -> String {
    result.description.clone().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(FIXTURE_SUFFIX).to_string())
            .unwrap_or_else(|| "?".to_string())
    })
}

#[derive(Default)]
struct Summary {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Summary {
    fn record(&mut self, result: TestResult, no_color: bool) {
        match result.outcome {
            TestOutcome::Pass => {
                eprintln!("  {}  {}", paint("PASS", "32", no_color), label_for(&result));
                self.passed += 1;
            }
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), label_for(&result));
                self.failures.push(result);
            }
        }
    }

    /// Print failure reasons and the totals; returns the exit code.
    fn finish(&self, no_color: bool) -> i32 {
        for failure in &self.failures {
            if let TestOutcome::Fail(reason) = &failure.outcome {
                eprintln!();
                eprintln!("{} {}", paint("FAIL", "31", no_color), failure.path.display());
                reason.lines().for_each(|line| eprintln!("    {}", line));
            }
        }

        let status = if self.failures.is_empty() {
            paint("ok", "32", no_color)
        } else {
            paint("FAILED", "31", no_color)
        };
        eprintln!();
        eprintln!(
            "{} fixtures: {} passed, {} failed",
            status,
            self.passed,
            self.failures.len()
        );
        i32::from(!self.failures.is_empty())
    }
}

/// Run every `.fixture` under `path` (or `path` itself if it is a file),
/// optionally only those in `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        filter_categories(discover_fixtures(path), categories)
    };

    if selected.is_empty() {
        eprintln!("no {} files to run under {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let mut summary = Summary::default();
    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", paint(category_label(category), "1", no_color));
        for file in files {
            summary.record(run_single_test(file), no_color);
        }
    }
    summary.finish(no_color)
}

fn in_category(category: &str, wanted: &str) -> bool {
    category == wanted
        || category
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn filter_categories(
    mut all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all;
    }

    let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();
    for name in &wanted {
        if !all.keys().any(|c| in_category(c, name)) {
            eprintln!("warning: no fixtures in category '{}'", name);
        }
    }
    all.retain(|category, _| wanted.iter().any(|w| in_category(category, w)));
    all
}
