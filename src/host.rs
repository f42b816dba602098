//! Host environment identification.
//!
//! The launcher logs where it is running before doing anything else. CI
//! systems advertise themselves through well-known environment variables;
//! detection is ordered so a host exposing several markers at once is
//! classified by priority rather than rejected.

/// Read-only view of the ambient process environment.
///
/// Injected so classification stays a pure function and tests can substitute
/// a fixed environment.
pub trait EnvProbe {
    /// Value of the named environment variable, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// Probe backed by the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl EnvProbe for SystemProbe {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Describe the host executing the launcher. Never fails.
///
/// First match wins: GitHub Actions, then GitLab CI, then Drone CI, then an
/// interactive terminal, then the literal `"unknown"`.
pub fn describe_host(probe: &dyn EnvProbe) -> String {
    if probe.var("GITHUB_ACTIONS").is_some() {
        let image = probe.var("ImageVersion").unwrap_or_else(|| "?".into());
        let os = probe.var("RUNNER_OS").unwrap_or_else(|| "?".into());
        let arch = probe.var("RUNNER_ARCH").unwrap_or_else(|| "?".into());
        return format!("GitHub Actions runner {image} ({os} {arch})");
    }

    if probe.var("GITLAB_CI").is_some() {
        let version = probe.var("CI_RUNNER_VERSION").unwrap_or_else(|| "?".into());
        return format!("GitLab CI runner {version}");
    }

    if probe.var("DRONE").is_some() {
        let version = probe.var("DRONE_SYSTEM_VERSION").unwrap_or_else(|| "?".into());
        return format!("Drone CI {version}");
    }

    if let Some(term) = probe.var("TERM") {
        return match (
            probe.var("TERM_PROGRAM"),
            probe.var("TERM_PROGRAM_VERSION"),
        ) {
            (Some(program), Some(version)) => format!("terminal {term} ({program} {version})"),
            (Some(program), None) => format!("terminal {term} ({program})"),
            _ => format!("terminal {term}"),
        };
    }

    "unknown".to_string()
}
