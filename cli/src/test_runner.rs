use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use quizgraph::{QuizGraph, QuizKind, text_to_graph};

/// Frontmatter of a `.test.md` fixture. Every `expect_*` count left out is
/// not checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub expect_nodes: Option<usize>,

    #[serde(default)]
    pub expect_cards: Option<usize>,

    #[serde(default)]
    pub expect_clozes: Option<usize>,

    #[serde(default)]
    pub expect_matches: Option<usize>,

    /// Number of nodes with at least one child.
    #[serde(default)]
    pub expect_edge_parents: Option<usize>,

    /// Total number of edges.
    #[serde(default)]
    pub expect_edges: Option<usize>,

    /// Compilation must fail with a message containing this substring.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Split a `.test.md` file into its TOML config and the Markdown under test.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + "\n---".len()..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
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

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let outcome = match check(&config, text_to_graph(source)) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };
    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Compare a compilation result against the fixture's expectations.
/// Returns `Some(reason)` on mismatch.
fn check<E: std::fmt::Display>(config: &TestConfig, result: Result<QuizGraph, E>) -> Option<String> {
    let graph = match (&config.expect_error, result) {
        (Some(expected), Err(err)) => {
            let message = err.to_string();
            return (!message.contains(expected.as_str())).then(|| {
                format!("expected error containing \"{}\", got: {}", expected, message)
            });
        }
        (Some(expected), Ok(_)) => {
            return Some(format!(
                "expected error containing \"{}\", but compilation succeeded",
                expected
            ));
        }
        (None, Err(err)) => return Some(format!("unexpected compile error: {}", err)),
        (None, Ok(graph)) => graph,
    };

    let counts = [
        ("nodes", config.expect_nodes, graph.len()),
        ("cards", config.expect_cards, graph.count_kind(QuizKind::Card)),
        ("clozes", config.expect_clozes, graph.count_kind(QuizKind::Cloze)),
        ("matches", config.expect_matches, graph.count_kind(QuizKind::Match)),
        ("edge parents", config.expect_edge_parents, graph.edges.len()),
        ("edges", config.expect_edges, graph.edge_count()),
    ];
    let mismatches: Vec<String> = counts
        .iter()
        .filter_map(|&(what, expected, actual)| {
            let expected = expected?;
            (expected != actual).then(|| format!("{}: expected {}, got {}", what, expected, actual))
        })
        .collect();

    (!mismatches.is_empty()).then(|| mismatches.join("\n"))
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the categories matching one of `requested` (a category or any of its
/// parents). An empty request keeps everything.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let nested = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&nested) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

fn report_line(result: &TestResult, no_color: bool) {
    let label = match result.outcome {
        TestOutcome::Pass => paint("PASS", "32", no_color),
        TestOutcome::Fail(_) => paint("FAIL", "31", no_color),
    };
    eprintln!("  {}  {}", label, result.label());
}

/// Print failure details and the summary line. Returns the exit code.
fn report_summary(failures: &[TestResult], passed: usize, no_color: bool) -> i32 {
    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let all_categories = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all_categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let selected = if path.is_file() {
        select_categories(&all_categories, &[])
    } else {
        select_categories(&all_categories, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(category), "1", no_color));
        }
        for file in *files {
            let result = run_single_test(file);
            report_line(&result, no_color);
            match result.outcome {
                TestOutcome::Pass => passed += 1,
                TestOutcome::Fail(_) => failures.push(result),
            }
        }
    }

    report_summary(&failures, passed, no_color)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const HEADER_ONLY: &str = "# @ 私 @ わたし @ わたくし @ あたし\n";

    fn fixture(frontmatter: &str, body: &str) -> String {
        format!("---\n{}\n---\n{}", frontmatter, body)
    }

    #[test]
    fn frontmatter_and_body() {
        let content = fixture("description = \"three cards\"\nexpect_nodes = 3", HEADER_ONLY);
        let (config, source) = parse_test_file(&content).unwrap();
        assert_eq!(config.description.as_deref(), Some("three cards"));
        assert_eq!(config.expect_nodes, Some(3));
        assert_eq!(config.expect_edges, None);
        assert_eq!(source, HEADER_ONLY);
    }

    #[test]
    fn frontmatter_errors() {
        assert!(parse_test_file(HEADER_ONLY).unwrap_err().contains("opening"));
        assert!(parse_test_file("---\nexpect_nodes = 3\n").unwrap_err().contains("closing"));
        assert!(parse_test_file(&fixture("expect_nodes = \"x\"", "")).unwrap_err().contains("TOML"));
        assert!(parse_test_file(&fixture("expect_nodez = 3", "")).is_err());
    }

    #[test]
    fn counts_are_checked() {
        let config = TestConfig {
            expect_nodes: Some(3),
            expect_edge_parents: Some(3),
            expect_edges: Some(4),
            expect_clozes: Some(0),
            ..Default::default()
        };
        assert_eq!(check(&config, text_to_graph(HEADER_ONLY)), None);

        let config = TestConfig {
            expect_cards: Some(1),
            ..Default::default()
        };
        let reason = check(&config, text_to_graph(HEADER_ONLY)).unwrap();
        assert_eq!(reason, "cards: expected 1, got 3");
    }

    #[test]
    fn expected_errors() {
        let config = TestConfig {
            expect_error: Some("not found".into()),
            ..Default::default()
        };
        assert_eq!(check(&config, text_to_graph("# @ 私 @ わたし\n- @fill 猫\n")), None);
        assert!(check(&config, text_to_graph(HEADER_ONLY)).unwrap().contains("succeeded"));

        let reason = check(&TestConfig::default(), text_to_graph("# @ 私 @ わたし\n- @fill 猫\n")).unwrap();
        assert!(reason.starts_with("unexpected compile error"));
    }

    #[test]
    fn runs_a_fixture_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("basics")).unwrap();
        fs::write(
            dir.path().join("basics/header.test.md"),
            fixture("expect_nodes = 3", HEADER_ONLY),
        )
        .unwrap();
        fs::write(dir.path().join("notes.md"), HEADER_ONLY).unwrap();

        let categories = discover_categorized(dir.path());
        assert_eq!(categories.len(), 1);
        assert_eq!(categories["basics"].len(), 1);

        assert_eq!(run_tests(dir.path(), true, &[]), 0);
        assert_eq!(run_tests(dir.path(), true, &["basics".to_string()]), 0);
        assert_eq!(run_tests(dir.path(), true, &["missing".to_string()]), 1);

        fs::write(
            dir.path().join("wrong.test.md"),
            fixture("expect_nodes = 4", HEADER_ONLY),
        )
        .unwrap();
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
        assert_eq!(run_tests(&dir.path().join("basics/header.test.md"), true, &[]), 0);
    }
}
