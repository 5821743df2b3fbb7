/// Patterns compiled into the binary, as `(name, yaml)`.
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    (
        "matrix-test",
        include_str!("../../../../patterns/matrix-test.yml"),
    ),
    (
        "staged-rollout",
        include_str!("../../../../patterns/staged-rollout.yml"),
    ),
    (
        "oidc-deploy",
        include_str!("../../../../patterns/oidc-deploy.yml"),
    ),
    (
        "dependency-cache",
        include_str!("../../../../patterns/dependency-cache.yml"),
    ),
    (
        "security-scan",
        include_str!("../../../../patterns/security-scan.yml"),
    ),
];
