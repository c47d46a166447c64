//! Integration tests for rewriting tagged C++ files

use memoizer_core::config;
use memoizer_core::{rewrite_file, rewrite_path, rewrite_source, write_patched, ResolvedConfig};
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("cpp")
        .join(name)
}

fn defaults() -> ResolvedConfig {
    ResolvedConfig::defaults().unwrap()
}

#[test]
fn test_fib_forward_declaration_precedes_renamed_body() {
    let report = rewrite_file(&fixture_path("fib.cpp"), &defaults()).unwrap();
    assert_eq!(report.rewritten.len(), 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.rewritten[0].function, "fib");
    assert_eq!(report.rewritten[0].mangled_name, "fib__original__");
    assert_eq!(report.rewritten[0].line, 7);

    let patched = &report.patched;
    let declaration = patched.find("int fib(int n);").unwrap();
    let renamed = patched.find("int fib__original__(int n) {").unwrap();
    let wrapper = patched.find("int fib(int n) {").unwrap();
    assert!(declaration < renamed);
    assert!(renamed < wrapper);
}

#[test]
fn test_fib_recursion_goes_through_wrapper() {
    let report = rewrite_file(&fixture_path("fib.cpp"), &defaults()).unwrap();
    let patched = &report.patched;

    let body_start = patched.find("int fib__original__(int n) {").unwrap();
    let body_end = body_start + patched[body_start..].find("\n}").unwrap();
    let body = &patched[body_start..body_end];

    // The self-calls still name `fib`, which now resolves to the wrapper
    assert!(body.contains("fib(n - 1) + fib(n - 2)"));
    assert!(!body.contains("fib__original__(n"));
    assert!(patched.contains("static const auto proxy = memoize(fib__original__);\nreturn proxy(n);"));
}

#[test]
fn test_mixed_file_isolates_failures() {
    let report = rewrite_file(&fixture_path("mixed.cpp"), &defaults()).unwrap();

    let rewritten: Vec<(&str, u32)> = report
        .rewritten
        .iter()
        .map(|r| (r.function.as_str(), r.line))
        .collect();
    assert_eq!(rewritten, vec![("choose", 4), ("scale", 15)]);

    let failures: Vec<(&str, u32, &str)> = report
        .failures
        .iter()
        .map(|f| (f.function.as_str(), f.line, f.kind.as_str()))
        .collect();
    assert_eq!(
        failures,
        vec![
            ("no_body", 9, "missing_body"),
            ("cell", 12, "unsupported_signature"),
        ]
    );

    // Failed functions are left byte-for-byte untouched
    assert!(report.patched.contains("[[memoize]] int no_body(int x);\n\nstruct Grid"));
    assert!(report
        .patched
        .contains("    [[memoize]] int cell(int r, int c) { return r * c; }\n"));
}

#[test]
fn test_storage_class_carried_to_every_generated_signature() {
    let report = rewrite_file(&fixture_path("mixed.cpp"), &defaults()).unwrap();
    let patched = &report.patched;

    assert!(patched.contains("[[memoize]] static double choose(int n, int k);\n"));
    assert!(patched.contains("static double choose__original__(int n, int k) {"));
    assert!(patched.contains("static double choose(int n, int k) {\nstatic const auto proxy"));
}

#[test]
fn test_name_collision_skips_only_that_function() {
    let report = rewrite_file(&fixture_path("collision.cpp"), &defaults()).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].function, "square");
    assert_eq!(report.failures[0].kind, "name_collision");
    assert!(report.failures[0].message.contains("square__original__"));

    assert_eq!(report.rewritten.len(), 1);
    assert_eq!(report.rewritten[0].function, "cube");
    assert!(report.patched.contains("[[memoize]] int square(int x) {\n    return x * x;\n}"));
}

#[test]
fn test_overloads_are_all_rejected() {
    let source = "[[memoize]] int area(int side) { return side * side; }\n\
                  [[memoize]] int area(int w, int h) { return w * h; }\n\
                  [[memoize]] int perimeter(int side) { return 4 * side; }\n";
    let rewrite = rewrite_source(source, "shapes.cpp", &defaults()).unwrap();

    let kinds: Vec<(&str, &str)> = rewrite
        .failures
        .iter()
        .map(|f| (f.error.function(), f.error.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![("area", "overloaded_name"), ("area", "overloaded_name")]
    );
    assert_eq!(rewrite.rewritten.len(), 1);
    assert_eq!(rewrite.rewritten[0].name, "perimeter");
    assert!(rewrite.patched.starts_with(
        "[[memoize]] int area(int side) { return side * side; }\n\
         [[memoize]] int area(int w, int h) { return w * h; }\n"
    ));
}

#[test]
fn test_untagged_source_is_unchanged() {
    let source = "int f(int x) { return x; }\n[[nodiscard]] int g(int x) { return x; }\n";
    let rewrite = rewrite_source(source, "plain.cpp", &defaults()).unwrap();
    assert!(rewrite.is_unchanged());
    assert_eq!(rewrite.patched, source);
    assert!(rewrite.failures.is_empty());
}

#[test]
fn test_rewriting_twice_adds_nothing() {
    for name in ["fib.cpp", "mixed.cpp", "collision.cpp"] {
        let config = defaults();
        let first = rewrite_file(&fixture_path(name), &config).unwrap();
        let second = rewrite_source(&first.patched, name, &config).unwrap();

        assert!(second.rewritten.is_empty(), "{} was rewritten twice", name);
        assert_eq!(second.patched, first.patched, "{} changed on the second pass", name);
    }
}

#[test]
fn test_rewrite_path_over_fixture_directory() {
    let dir = fixture_path("");
    let reports = rewrite_path(&dir, &defaults()).unwrap();

    let files: Vec<String> = reports
        .iter()
        .map(|r| {
            PathBuf::from(&r.file)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(files, vec!["collision.cpp", "fib.cpp", "memoize.hpp", "mixed.cpp"]);

    let header = &reports[2];
    assert!(header.rewritten.is_empty() && header.failures.is_empty());
    assert!(!header.is_changed());
}

#[test]
fn test_project_config_drives_marker_adapter_and_excludes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(
        root.join(".memoizerrc.json"),
        r#"{"marker": "cached", "adapter": "::cache::wrap", "exclude": ["**/generated/**"]}"#,
    )
    .unwrap();
    fs::create_dir(root.join("src")).unwrap();
    fs::create_dir(root.join("generated")).unwrap();
    fs::write(
        root.join("src").join("a.cpp"),
        "[[cached]] int f(int x) { return x; }\n[[memoize]] int g(int x) { return x; }\n",
    )
    .unwrap();
    fs::write(
        root.join("generated").join("b.cpp"),
        "[[cached]] int h(int x) { return x; }\n",
    )
    .unwrap();

    let config = config::load_and_resolve(root, None).unwrap();
    assert_eq!(config.config_path, Some(root.join(".memoizerrc.json")));

    let reports = rewrite_path(root, &config).unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].file.ends_with("a.cpp"));
    assert_eq!(reports[0].rewritten.len(), 1);
    assert_eq!(reports[0].rewritten[0].function, "f");
    assert_eq!(
        reports[0].patched,
        "[[cached]] int f(int x);\n\
         int f__original__(int x) { return x; }\n\
         \n\
         int f(int x) {\n\
         static const auto proxy = ::cache::wrap(f__original__);\n\
         return proxy(x);\n\
         }\n\
         [[memoize]] int g(int x) { return x; }\n"
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("memoizer.config.json"), r#"{"marker": "not valid"}"#).unwrap();
    assert!(config::load_and_resolve(dir.path(), None).is_err());

    fs::write(dir.path().join("memoizer.config.json"), r#"{"markers": "memoize"}"#).unwrap();
    assert!(config::load_and_resolve(dir.path(), None).is_err());
}

#[test]
fn test_write_patched_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("fib.cpp");
    fs::copy(fixture_path("fib.cpp"), &file).unwrap();

    let config = defaults();
    let report = rewrite_file(&file, &config).unwrap();
    assert!(write_patched(&report).unwrap());
    assert_eq!(fs::read_to_string(&file).unwrap(), report.patched);

    // The forward declaration keeps the marker but has no body, so the second
    // pass reports it and writes nothing
    let again = rewrite_file(&file, &config).unwrap();
    assert!(again.rewritten.is_empty());
    assert_eq!(again.failures.len(), 1);
    assert_eq!(again.failures[0].kind, "missing_body");
    assert!(!write_patched(&again).unwrap());
}

#[test]
fn test_zero_parameter_function() {
    let source = "[[memoize]] void g() { work(); }\n";
    let rewrite = rewrite_source(source, "g.cpp", &defaults()).unwrap();

    assert_eq!(
        rewrite.patched,
        "[[memoize]] void g();\n\
         void g__original__() { work(); }\n\
         \n\
         void g() {\n\
         static const auto proxy = memoize(g__original__);\n\
         return proxy();\n\
         }\n"
    );
}

#[test]
fn test_relative_include_pattern_matches_under_project_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join(".memoizerrc.json"), r#"{"include": ["src/**/*.cpp"]}"#).unwrap();
    fs::create_dir(root.join("src")).unwrap();
    fs::create_dir(root.join("tools")).unwrap();
    fs::write(root.join("src").join("a.cpp"), "[[memoize]] int f(int x) { return x; }\n").unwrap();
    fs::write(root.join("tools").join("b.cpp"), "[[memoize]] int g(int x) { return x; }\n").unwrap();

    let config = config::load_and_resolve(root, None).unwrap();
    let reports = rewrite_path(root, &config).unwrap();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].file.ends_with("a.cpp"));
    assert_eq!(reports[0].rewritten.len(), 1);
    assert_eq!(reports[0].rewritten[0].function, "f");
}

#[test]
fn test_parameters_that_break_the_wrapper_are_rejected() {
    let source = "[[memoize]] int f(int proxy) { return proxy; }\n\
                  [[memoize]] int g(int memoize) { return memoize; }\n\
                  [[memoize]] int h(int x) { return x; }\n";
    let rewrite = rewrite_source(source, "shadow.cpp", &defaults()).unwrap();

    let failures: Vec<(&str, &str)> = rewrite
        .failures
        .iter()
        .map(|f| (f.error.function(), f.error.kind()))
        .collect();
    assert_eq!(
        failures,
        vec![("f", "unsupported_signature"), ("g", "unsupported_signature")]
    );
    assert_eq!(rewrite.rewritten.len(), 1);
    assert_eq!(rewrite.rewritten[0].name, "h");
    assert!(rewrite.patched.starts_with(
        "[[memoize]] int f(int proxy) { return proxy; }\n\
         [[memoize]] int g(int memoize) { return memoize; }\n"
    ));
}

#[test]
fn test_parameter_named_like_a_qualified_adapter_namespace() {
    let source = "[[memoize]] int f(int cache) { return cache; }\n";

    let mut config = defaults();
    config.set_adapter("cache::memoize").unwrap();
    let rewrite = rewrite_source(source, "ns.cpp", &config).unwrap();
    assert_eq!(rewrite.failures[0].error.kind(), "unsupported_signature");
    assert!(rewrite.is_unchanged());

    config.set_adapter("::cache::memoize").unwrap();
    let rewrite = rewrite_source(source, "ns.cpp", &config).unwrap();
    assert!(rewrite.failures.is_empty());
    assert!(rewrite.patched.contains("static const auto proxy = ::cache::memoize(f__original__);"));
}

#[test]
fn test_constexpr_and_consteval_are_rejected() {
    let source = "[[memoize]] constexpr int h(int x) { return x; }\n\
                  [[memoize]] consteval int k(int x) { return x; }\n\
                  [[memoize]] inline int m(int x) { return x; }\n";
    let rewrite = rewrite_source(source, "compile_time.cpp", &defaults()).unwrap();

    let failures: Vec<(&str, u32, &str)> = rewrite
        .failures
        .iter()
        .map(|f| (f.error.function(), f.line, f.error.kind()))
        .collect();
    assert_eq!(
        failures,
        vec![("h", 1, "unsupported_signature"), ("k", 2, "unsupported_signature")]
    );
    assert_eq!(rewrite.rewritten.len(), 1);
    assert_eq!(rewrite.rewritten[0].name, "m");
    assert!(rewrite.patched.contains("inline int m__original__(int x)"));
}
