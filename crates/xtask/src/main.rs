use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// The domain crate stays runtime- and transport-free.
const DOMAIN_CRATE: &str = "streamtorrent-domain";
const FORBIDDEN_DOMAIN_DEPS: &[&str] = &[
    "tokio",
    "tokio-util",
    "reqwest",
    "async-trait",
    "axum",
    "streamtorrent-player",
];

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;
    let domain = metadata
        .packages
        .iter()
        .find(|p| p.name == DOMAIN_CRATE)
        .with_context(|| format!("{DOMAIN_CRATE} not found in workspace"))?;

    let mut violations: Vec<String> = domain
        .dependencies
        .iter()
        // dev-dependencies may use anything
        .filter(|d| d.kind.as_deref() != Some("dev"))
        .filter(|d| FORBIDDEN_DOMAIN_DEPS.contains(&d.name.as_str()))
        .map(|d| format!("{DOMAIN_CRATE} depends on {}", d.name))
        .collect();

    let src = domain
        .manifest_path
        .parent()
        .context("manifest has no parent directory")?
        .join("src");
    violations.extend(scan_sources(&src)?);

    if violations.is_empty() {
        println!("arch-check: ok");
        return Ok(());
    }
    for violation in &violations {
        eprintln!("arch-check: {violation}");
    }
    anyhow::bail!("{} architecture violation(s)", violations.len())
}

/// Flag `async fn` and runtime paths in domain sources.
fn scan_sources(dir: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = regex_lite::Regex::new(r"\basync\s+fn\b|\btokio::|\breqwest::")
        .context("compiling source pattern")?;
    let mut violations = Vec::new();

    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            violations.extend(scan_sources(&path)?);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        for (line_no, line) in text.lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            if pattern.is_match(line) {
                violations.push(format!("{}:{}: {}", path.display(), line_no + 1, line.trim()));
            }
        }
    }
    Ok(violations)
}
