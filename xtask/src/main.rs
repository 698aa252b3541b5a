// Finance Web - Build Task Runner
// Unified build system using cargo xtask pattern

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use xshell::{Shell, cmd};

const DEFAULT_BUNDLE: &str = "en";

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("build") => {
            let release = args.contains(&"--release".to_string());
            build(&sh, release)
        },
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        },
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        Some("check-locales") => check_locales(),
        _ => {
            print_help();
            Ok(())
        },
    }
}

fn print_help() {
    println!("Finance Web - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the web shell");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Build and run the application");
    println!("  clean               Clean build artifacts");
    println!("  ci                  Run all CI checks (format + clippy + locales + build + test)");
    println!("  dist                Create distribution package (tar.gz)");
    println!("  check-locales       Check every bundle against the {} bundle", DEFAULT_BUNDLE);
    println!();
    println!("Examples:");
    println!("  cargo xtask build --release");
    println!("  cargo xtask run -- --port 9090");
    println!("  cargo xtask check-locales");
}

/// Build the web shell
fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building Finance Web{}...", if release { " (release)" } else { "" });
    let _dir = sh.push_dir(project_root());

    if release {
        cmd!(sh, "cargo build --release -p finance-web")
            .run()
            .context("Failed to build in release mode")?;
        create_distribution(sh)?;
    } else {
        cmd!(sh, "cargo build -p finance-web").run().context("Failed to build")?;
    }

    println!("✅ Build complete");
    Ok(())
}

/// Create distribution package structure
fn create_distribution(sh: &Shell) -> Result<()> {
    let project = project_root();
    let dist_dir = project.join("build/dist");

    for sub in ["bin", "conf", "data", "logs", "bundles"] {
        sh.create_dir(dist_dir.join(sub))?;
    }

    let binary_src = project.join("target/release/finance-web");
    let binary_dst = dist_dir.join("bin/finance-web");
    cmd!(sh, "cp {binary_src} {binary_dst}").run()?;

    // Shipped next to the binary so translations can be edited without a rebuild
    let bundles_src = project.join("web/bundles");
    for entry in std::fs::read_dir(&bundles_src)? {
        let path = entry?.path();
        if let Some(name) = path.file_name() {
            sh.copy_file(&path, dist_dir.join("bundles").join(name))?;
        }
    }

    create_config_file(&dist_dir)?;

    Ok(())
}

/// Create default config file
fn create_config_file(dist_dir: &Path) -> Result<()> {
    let config_path = dist_dir.join("conf/config.toml");
    let config_content = r#"[server]
host = "0.0.0.0"
port = 8080

[database]
url = "sqlite://data/finance-web.db"

[i18n]
default_locale = "en"
locales = ["en", "lo", "th", "jp"]
bundle_dir = "bundles"
prefer_saved_locale = false
cache_bundles = true

[auth]
api_base_url = "http://localhost:3000/api"
request_timeout = "10s"

[logging]
level = "info,finance_web=debug"
file = "logs/finance-web.log"

[static_config]
enabled = false
web_root = "public"

[routes]
public_pages = ["login", "register", "pricing", "features", "privacy", "terms", "about", "security"]
"#;

    std::fs::write(config_path, config_content).context("Failed to create config file")?;

    Ok(())
}

/// Run all tests
fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;

    println!("✅ All tests passed!");
    Ok(())
}

/// Format code
fn format(sh: &Shell, check: bool) -> Result<()> {
    println!("🎨 Formatting Rust code...");
    let _dir = sh.push_dir(project_root());

    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }

    Ok(())
}

/// Run clippy checks
fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

/// Build and run the application
fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 Running Finance Web...");
    let _dir = sh.push_dir(project_root());

    let mut cmd = cmd!(sh, "cargo run -p finance-web --");
    for arg in args.iter().filter(|arg| *arg != "--") {
        cmd = cmd.arg(arg);
    }

    cmd.run().context("Failed to run application")?;

    Ok(())
}

/// Clean build artifacts
fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning build artifacts...");
    let project = project_root();

    let _dir = sh.push_dir(&project);
    cmd!(sh, "cargo clean").run()?;

    let build_dir = project.join("build");
    if build_dir.exists() {
        sh.remove_path(&build_dir)?;
    }

    println!("✅ Clean complete!");
    Ok(())
}

/// Run all CI checks
fn ci(sh: &Shell) -> Result<()> {
    println!("🔄 Running CI pipeline...");
    println!();

    println!("📝 [1/5] Checking code format...");
    format(sh, true)?;

    println!("🔍 [2/5] Running clippy checks...");
    clippy(sh)?;

    println!("🌐 [3/5] Checking translation bundles...");
    check_locales()?;

    println!("🔨 [4/5] Building project...");
    build(sh, true)?;

    println!("🧪 [5/5] Running tests...");
    test(sh)?;

    println!();
    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

/// Create distribution package (tar.gz)
fn dist(sh: &Shell) -> Result<()> {
    println!("📦 Creating distribution package...");
    build(sh, true)?;

    let dist_dir = project_root().join("build/dist");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("finance-web-{}.tar.gz", timestamp);
    let package_path = dist_dir.join(&package_name);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf data logs bundles")
        .run()
        .context("Failed to create tarball")?;

    println!();
    println!("✅ Distribution package created!");
    println!("   Location: {}", package_path.display());
    println!("   Size: {} KB", std::fs::metadata(&package_path)?.len() / 1024);

    Ok(())
}

/// Every bundle must parse, hold only strings and sections, and stay a
/// subset of the default bundle's keys.
fn check_locales() -> Result<()> {
    let bundle_dir = project_root().join("web/bundles");
    let baseline = read_bundle(&bundle_dir.join(format!("{}.json", DEFAULT_BUNDLE)))?;
    let baseline_leaves = count_leaves(&baseline);

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&bundle_dir)
        .with_context(|| format!("Failed to read {}", bundle_dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut failures = 0;
    for path in paths {
        let name = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default().to_string();
        if name == DEFAULT_BUNDLE {
            continue;
        }

        let problems = match read_bundle(&path) {
            Ok(bundle) => {
                let mut problems = Vec::new();
                compare(&bundle, &baseline, "", &mut problems);
                if problems.is_empty() {
                    println!(
                        "✅ {}: {}/{} keys translated",
                        name,
                        count_leaves(&bundle),
                        baseline_leaves
                    );
                }
                problems
            },
            Err(e) => vec![format!("{:#}", e)],
        };

        for problem in &problems {
            println!("❌ {}: {}", name, problem);
        }
        failures += problems.len();
    }

    if failures > 0 {
        bail!("{} translation bundle problem(s) found", failures);
    }
    Ok(())
}

fn read_bundle(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => bail!("{} is not a JSON object", path.display()),
    }
}

fn compare(bundle: &Map<String, Value>, baseline: &Map<String, Value>, prefix: &str, problems: &mut Vec<String>) {
    for (key, value) in bundle {
        let path = if prefix.is_empty() { key.clone() } else { format!("{}.{}", prefix, key) };
        match (value, baseline.get(key)) {
            (_, None) => problems.push(format!("'{}' is not in the {} bundle", path, DEFAULT_BUNDLE)),
            (Value::Object(nested), Some(Value::Object(expected))) => {
                compare(nested, expected, &path, problems)
            },
            (Value::String(_), Some(Value::String(_))) => {},
            (Value::String(_) | Value::Object(_), Some(_)) => {
                problems.push(format!("'{}' has a different shape than in the {} bundle", path, DEFAULT_BUNDLE))
            },
            (_, Some(_)) => problems.push(format!("'{}' must be a string or a section", path)),
        }
    }
}

fn count_leaves(map: &Map<String, Value>) -> usize {
    map.values()
        .map(|value| match value {
            Value::Object(nested) => count_leaves(nested),
            _ => 1,
        })
        .sum()
}

/// Get project root directory
fn project_root() -> PathBuf {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
