//! Environment probing
//!
//! Probing is read-only and never cached: every call runs the detection
//! command again, because an install earlier in the same run may have changed
//! the answer.

use tracing::{debug, warn};

use super::{Detection, PrerequisiteSpec};
use crate::error::InstallerError;
use crate::runner::CommandRunner;
use crate::version::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub name: String,
    pub present: bool,
    pub version: Option<Version>,
    pub satisfies_minimum: bool,
}

impl ProbeResult {
    fn absent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            present: false,
            version: None,
            satisfies_minimum: false,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.present && self.satisfies_minimum
    }
}

/// Probe results for every prerequisite, in declared order, taken at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentSnapshot {
    pub results: Vec<ProbeResult>,
}

impl EnvironmentSnapshot {
    pub fn all_satisfied(&self) -> bool {
        self.results.iter().all(ProbeResult::is_satisfied)
    }

    pub fn unmet(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.is_satisfied())
    }
}

/// Probe one prerequisite. Anything that prevents a positive answer
/// (missing executable, failed command, old version) reads as unmet.
pub fn probe(runner: &dyn CommandRunner, spec: &PrerequisiteSpec) -> ProbeResult {
    let output = match runner.run(&spec.detect) {
        Ok(output) => output,
        Err(InstallerError::CommandNotFound { .. }) => {
            debug!(prerequisite = %spec.name, "not found on PATH");
            return ProbeResult::absent(&spec.name);
        }
        Err(e) => {
            let failure = InstallerError::DetectionFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            };
            warn!("{}; treating as absent", failure);
            return ProbeResult::absent(&spec.name);
        }
    };

    if !output.success() {
        debug!(
            prerequisite = %spec.name,
            exit_code = ?output.exit_code,
            "detection command failed"
        );
        return ProbeResult::absent(&spec.name);
    }

    let (present, version) = match spec.detection {
        Detection::NonEmptyOutput => (!output.stdout.trim().is_empty(), None),
        Detection::VersionBanner => (true, Version::extract(&output.stdout)),
    };

    let satisfies_minimum = match (spec.minimum_version, version) {
        (None, _) => present,
        (Some(minimum), Some(found)) => present && found >= minimum,
        (Some(_), None) => false,
    };

    let result = ProbeResult {
        name: spec.name.clone(),
        present,
        version,
        satisfies_minimum,
    };
    debug!(?result, "probed");
    result
}

/// Probe every prerequisite in order
pub fn snapshot(runner: &dyn CommandRunner, specs: &[PrerequisiteSpec]) -> EnvironmentSnapshot {
    EnvironmentSnapshot {
        results: specs.iter().map(|spec| probe(runner, spec)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prereq::{node, xcode_command_line_tools};
    use crate::test_fixtures::FakeHost;

    #[test]
    fn test_missing_executable_is_absent() {
        let host = FakeHost::new();
        let result = probe(&host, &node(Version::new(20, 0, 0)));
        assert!(!result.present);
        assert!(!result.is_satisfied());
    }

    #[test]
    fn test_version_satisfies_minimum() {
        let host = FakeHost::new();
        host.set_output("node --version", "v20.11.1\n");
        let result = probe(&host, &node(Version::new(20, 0, 0)));
        assert!(result.present);
        assert_eq!(result.version, Some(Version::new(20, 11, 1)));
        assert!(result.is_satisfied());
    }

    #[test]
    fn test_old_version_is_unmet() {
        let host = FakeHost::new();
        host.set_output("node --version", "v18.19.0\n");
        let result = probe(&host, &node(Version::new(20, 0, 0)));
        assert!(result.present);
        assert!(!result.satisfies_minimum);
        assert!(!result.is_satisfied());
    }

    #[test]
    fn test_unreadable_version_with_minimum_is_unmet() {
        let host = FakeHost::new();
        host.set_output("node --version", "weird build\n");
        let result = probe(&host, &node(Version::new(20, 0, 0)));
        assert!(result.present);
        assert_eq!(result.version, None);
        assert!(!result.is_satisfied());
    }

    #[test]
    fn test_failing_detection_is_absent() {
        let host = FakeHost::new();
        host.set_failure(
            "xcode-select -p",
            2,
            "xcode-select: error: unable to get active developer directory",
        );
        let result = probe(&host, &xcode_command_line_tools());
        assert!(!result.present);
    }

    #[test]
    fn test_spawn_failure_is_treated_as_absent() {
        let host = FakeHost::new();
        host.set_spawn_failure("xcode-select -p");
        let result = probe(&host, &xcode_command_line_tools());
        assert!(!result.present);
    }

    #[test]
    fn test_path_output_counts_as_present() {
        let host = FakeHost::new();
        host.set_output("xcode-select -p", "/Library/Developer/CommandLineTools\n");
        assert!(probe(&host, &xcode_command_line_tools()).is_satisfied());
    }

    #[test]
    fn test_probe_is_not_cached() {
        let host = FakeHost::new();
        let spec = node(Version::new(20, 0, 0));
        assert!(!probe(&host, &spec).is_satisfied());
        host.set_output("node --version", "v21.0.0");
        assert!(probe(&host, &spec).is_satisfied());
        assert_eq!(host.count("node --version"), 2);
    }

    #[test]
    fn test_snapshot_keeps_order() {
        let host = FakeHost::new();
        host.set_output("node --version", "v20.0.0");
        let specs = crate::prereq::catalog(Version::new(20, 0, 0));
        let snap = snapshot(&host, &specs);
        let names: Vec<&str> = snap.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["xcode-clt", "brew", "node"]);
        let unmet: Vec<&str> = snap.unmet().map(|r| r.name.as_str()).collect();
        assert_eq!(unmet, vec!["xcode-clt", "brew"]);
        assert!(!snap.all_satisfied());
        assert!(snap.results[2].is_satisfied());
    }
}
