//! Text-level helpers shared by step rules: ref pinning classification and
//! `${{ }}` expression scanning.

use regex::Regex;
use std::sync::OnceLock;

/// How firmly an action reference is pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPin {
    /// Full 40-character commit SHA.
    Sha,
    /// Version tag with at least a minor component (`v4.1`, `v4.1.2`).
    FullVersion,
    /// Major-only tag such as `v4`.
    MajorVersion,
    /// Branch names and other moving refs (`main`, `latest`, ...).
    Floating,
    Missing,
}

pub fn classify_ref(git_ref: Option<&str>) -> RefPin {
    static SHA: OnceLock<Regex> = OnceLock::new();
    static MAJOR: OnceLock<Regex> = OnceLock::new();
    static FULL: OnceLock<Regex> = OnceLock::new();

    let Some(git_ref) = git_ref.map(str::trim).filter(|r| !r.is_empty()) else {
        return RefPin::Missing;
    };
    let sha = SHA.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("sha pattern is valid"));
    let major = MAJOR.get_or_init(|| Regex::new(r"^v?\d+$").expect("major tag pattern is valid"));
    let full = FULL.get_or_init(|| {
        Regex::new(r"^v?\d+\.\d+(\.\d+)?([-+][0-9A-Za-z.-]+)?$").expect("version tag pattern is valid")
    });

    if sha.is_match(git_ref) {
        RefPin::Sha
    } else if full.is_match(git_ref) {
        RefPin::FullVersion
    } else if major.is_match(git_ref) {
        RefPin::MajorVersion
    } else {
        RefPin::Floating
    }
}

/// Contents of every `${{ ... }}` expression in `text`, trimmed.
pub fn expressions(text: &str) -> Vec<&str> {
    static EXPR: OnceLock<Regex> = OnceLock::new();
    let expr = EXPR.get_or_init(|| Regex::new(r"(?s)\$\{\{(.*?)\}\}").expect("expression pattern is valid"));
    expr.captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .collect()
}

/// Context references such as `github.event.issue.title` or `secrets.TOKEN`
/// appearing inside an expression.
pub fn context_references(expression: &str) -> Vec<&str> {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    let reference = REFERENCE.get_or_init(|| {
        Regex::new(r"\b(?:github|secrets)(?:\.[A-Za-z0-9_*-]+|\[[^\]]*\])+")
            .expect("context reference pattern is valid")
    });
    reference.find_iter(expression).map(|m| m.as_str()).collect()
}

/// Canonical form of a context reference: `['x']` / `["x"]` segments become
/// `.x` and the whole path is lowercased.
pub fn normalize_reference(reference: &str) -> String {
    static QUOTED_INDEX: OnceLock<Regex> = OnceLock::new();
    let quoted = QUOTED_INDEX.get_or_init(|| {
        Regex::new(r#"\[\s*(?:'([^'\]]*)'|"([^"\]]*)")\s*\]"#).expect("quoted index pattern is valid")
    });
    quoted
        .replace_all(reference, |captures: &regex::Captures<'_>| {
            let key = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            format!(".{}", key)
        })
        .to_lowercase()
}

/// Event payload fields an outside contributor can set freely, or an object
/// that contains such fields.
pub fn is_user_controlled(reference: &str) -> bool {
    static USER_CONTROLLED: OnceLock<Regex> = OnceLock::new();
    static CONTAINING_OBJECT: OnceLock<Regex> = OnceLock::new();
    let field = USER_CONTROLLED.get_or_init(|| {
        Regex::new(concat!(
            r"^github\.(?:head_ref|event\.(?:",
            r"(?:issue|pull_request|discussion)\.(?:title|body)",
            r"|(?:comment|review|review_comment)\.body",
            r"|pages(?:\[[^\]]*\]|\.\*)?\.page_name",
            r"|(?:commits(?:\[[^\]]*\]|\.\*)?|head_commit)\.(?:message|author\.(?:email|name))",
            r"|pull_request\.head\.(?:ref|label|repo\.default_branch)",
            r"|workflow_run\.(?:head_branch|head_commit\.(?:message|author\.(?:email|name)))",
            r"))$"
        ))
        .expect("user-controlled pattern is valid")
    });
    let object = CONTAINING_OBJECT.get_or_init(|| {
        Regex::new(concat!(
            r"^github\.event(?:\.(?:",
            r"issue|pull_request|discussion|comment|review|review_comment|head_commit",
            r"|commits(?:\[[^\]]*\]|\.\*)?|pages(?:\[[^\]]*\]|\.\*)?",
            r"|(?:commits(?:\[[^\]]*\]|\.\*)?|head_commit)\.author",
            r"|pull_request\.head(?:\.repo)?|workflow_run(?:\.head_commit(?:\.author)?)?",
            r"))?$"
        ))
        .expect("user-controlled object pattern is valid")
    });
    let reference = normalize_reference(reference);
    field.is_match(&reference) || object.is_match(&reference)
}

pub fn is_secret(reference: &str) -> bool {
    reference.starts_with("secrets.") || reference.starts_with("secrets[")
}

/// True when a cache key hashes at least one dependency lockfile.
pub fn key_hashes_lockfile(key: &str) -> bool {
    static HASH_FILES: OnceLock<Regex> = OnceLock::new();
    const LOCKFILES: &[&str] = &[
        "package-lock.json",
        "npm-shrinkwrap.json",
        "yarn.lock",
        "pnpm-lock.yaml",
        "bun.lockb",
        "cargo.lock",
        "go.sum",
        "poetry.lock",
        "pipfile.lock",
        "uv.lock",
        "gemfile.lock",
        "composer.lock",
        "packages.lock.json",
        "gradle.lockfile",
        "mix.lock",
        "pubspec.lock",
        "podfile.lock",
    ];
    let hash_files = HASH_FILES
        .get_or_init(|| Regex::new(r"hashFiles\(([^)]*)\)").expect("hashFiles pattern is valid"));
    hash_files.captures_iter(key).any(|captures| {
        let arguments = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        LOCKFILES.iter().any(|lockfile| arguments.contains(lockfile))
            || arguments.contains(".lock")
            || arguments.contains("requirements")
    })
}
