//! Install orchestration
//!
//! The run is an explicit state machine. [`transition`] is the whole
//! `(state, event) -> state` table; [`Orchestrator::run`] only produces events
//! by calling the collaborators for the current state.
//!
//! Nothing is persisted between runs. A second invocation starts at
//! [`State::Init`] and re-probes the host, so every step must be safe to repeat
//! against a partially prepared machine.

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::build::{self, BuildArtifact};
use crate::config::InstallerConfig;
use crate::deploy::{ArtifactDeployer, DeployOutcome};
use crate::error::{InstallerError, Result};
use crate::prereq::{self, EnvironmentSnapshot, InstallOutcome, PrerequisiteSpec, ProbeResult};
use crate::runner::CommandRunner;
use crate::source::{self, SourceRepository};
use crate::ui;


/// Non-terminal stages a run can fail in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ProbingPrereqs,
    InstallingPrereqs,
    Fetching,
    Building,
    Deploying,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ProbingPrereqs => "probing prerequisites",
            Step::InstallingPrereqs => "installing prerequisites",
            Step::Fetching => "fetching source",
            Step::Building => "building",
            Step::Deploying => "deploying",
        };
        f.write_str(name)
    }
}

/// Why a run stopped to wait for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequired {
    pub prerequisite: String,
    pub action: String,
}

impl RestartRequired {
    fn for_spec(spec: &PrerequisiteSpec) -> Self {
        Self {
            prerequisite: spec.name.clone(),
            action: spec.manual_action(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Init,
    ProbingPrereqs,
    InstallingPrereqs,
    Fetching,
    Building,
    Deploying,
    Done,
    /// Not an error: re-run once the manual step is finished
    Terminated(RestartRequired),
    Failed { step: Step, reason: String },
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Done | State::Terminated(_) | State::Failed { .. }
        )
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            State::ProbingPrereqs => Some(Step::ProbingPrereqs),
            State::InstallingPrereqs => Some(Step::InstallingPrereqs),
            State::Fetching => Some(Step::Fetching),
            State::Building => Some(Step::Building),
            State::Deploying => Some(Step::Deploying),
            _ => None,
        }
    }
}

/// Result of executing the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    AllSatisfied,
    SomeUnmet,
    PrereqsReady,
    RestartRequired(RestartRequired),
    StepSucceeded,
    StepFailed(String),
}

/// The transition table
pub fn transition(state: &State, event: Event) -> State {
    match (state, event) {
        (State::Init, Event::Start) => State::ProbingPrereqs,
        (State::ProbingPrereqs, Event::AllSatisfied) => State::Fetching,
        (State::ProbingPrereqs, Event::SomeUnmet) => State::InstallingPrereqs,
        (State::InstallingPrereqs, Event::PrereqsReady) => State::Fetching,
        (State::InstallingPrereqs, Event::RestartRequired(restart)) => State::Terminated(restart),
        (State::Fetching, Event::StepSucceeded) => State::Building,
        (State::Building, Event::StepSucceeded) => State::Deploying,
        (State::Deploying, Event::StepSucceeded) => State::Done,
        (terminal, _) if terminal.is_terminal() => terminal.clone(),
        (current, Event::StepFailed(reason)) => State::Failed {
            step: current.step().unwrap_or(Step::ProbingPrereqs),
            reason,
        },
        (current, event) => State::Failed {
            step: current.step().unwrap_or(Step::ProbingPrereqs),
            reason: format!("unexpected {:?} in state {:?}", event, current),
        },
    }
}

/// In-memory state of one invocation; dropped at process exit
#[derive(Debug)]
pub struct RunState {
    pub current: State,
    pub restart_install_occurred: bool,
    pub snapshot: Option<EnvironmentSnapshot>,
    pub history: Vec<State>,
}

impl RunState {
    fn new() -> Self {
        Self {
            current: State::Init,
            restart_install_occurred: false,
            snapshot: None,
            history: vec![State::Init],
        }
    }

    fn advance(&mut self, event: Event) {
        let next = transition(&self.current, event);
        info!(from = ?self.current, to = ?next, "transition");
        self.history.push(next.clone());
        self.current = next;
    }
}

/// What the invoker learns about a finished run
#[derive(Debug)]
pub struct RunReport {
    pub final_state: State,
    pub history: Vec<State>,
    pub restart_install_occurred: bool,
    pub installed: Option<PathBuf>,
}

impl RunReport {
    /// 0 for `Done` and for a requested restart, 1 for failures
    pub fn exit_code(&self) -> i32 {
        match self.final_state {
            State::Failed { .. } => 1,
            _ => 0,
        }
    }
}

/// Fixed facts about what is being built and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub version: String,
    pub repository_url: String,
    pub git_ref: String,
    pub source_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl Target {
    pub fn from_config(config: &InstallerConfig) -> Result<Self> {
        Ok(Self {
            version: config.version()?.to_string(),
            repository_url: config.repository_url.clone(),
            git_ref: config.git_ref()?,
            source_dir: config.source_dir()?,
            install_dir: config.install_dir()?,
        })
    }
}

/// Why a prerequisite still fails its probe right after a completed install
fn unmet_after_install(spec: &PrerequisiteSpec, after: &ProbeResult) -> String {
    if !after.present {
        return "still not detected after installation".to_string();
    }
    match (after.version, spec.minimum_version) {
        (Some(found), Some(minimum)) => format!(
            "found {} after installation, need >= {} (is an older copy earlier on PATH?)",
            found, minimum
        ),
        (None, Some(minimum)) => format!(
            "installed version could not be read, need >= {}",
            minimum
        ),
        _ => "still not usable after installation".to_string(),
    }
}

/// Sequences probing, installation, fetch, build and deployment
pub struct Orchestrator<'a> {
    runner: &'a dyn CommandRunner,
    repository: &'a dyn SourceRepository,
    deployer: &'a dyn ArtifactDeployer,
    prerequisites: Vec<PrerequisiteSpec>,
    target: Target,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        repository: &'a dyn SourceRepository,
        deployer: &'a dyn ArtifactDeployer,
        prerequisites: Vec<PrerequisiteSpec>,
        target: Target,
    ) -> Self {
        Self {
            runner,
            repository,
            deployer,
            prerequisites,
            target,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Drive the state machine to a terminal state
    pub fn run(&self) -> RunReport {
        let mut run = RunState::new();
        let mut artifact: Option<BuildArtifact> = None;
        let mut installed = None;

        while !run.current.is_terminal() {
            if let Some(step) = run.current.step() {
                ui::step_header(step);
            }

            let current = run.current.clone();
            let event = match &current {
                State::Init => Event::Start,
                State::ProbingPrereqs => {
                    let snapshot = prereq::snapshot(self.runner, &self.prerequisites);
                    ui::snapshot(&snapshot);
                    let event = if snapshot.all_satisfied() {
                        Event::AllSatisfied
                    } else {
                        Event::SomeUnmet
                    };
                    run.snapshot = Some(snapshot);
                    event
                }
                State::InstallingPrereqs => self.install_unmet(&mut run),
                State::Fetching => match self.fetch() {
                    Ok(()) => Event::StepSucceeded,
                    Err(e) => Event::StepFailed(e.to_string()),
                },
                State::Building => match build::build(self.runner, &self.target.source_dir) {
                    Ok(built) => {
                        artifact = Some(built);
                        Event::StepSucceeded
                    }
                    Err(e) => Event::StepFailed(e.to_string()),
                },
                State::Deploying => match artifact.take() {
                    Some(built) => match self.deployer.deploy(built, &self.target.install_dir) {
                        Ok(DeployOutcome::Installed(path)) => {
                            installed = Some(path);
                            Event::StepSucceeded
                        }
                        Err(e) => Event::StepFailed(e.to_string()),
                    },
                    None => Event::StepFailed("no build artifact to deploy".to_string()),
                },
                State::Done | State::Terminated(_) | State::Failed { .. } => break,
            };

            run.advance(event);
        }

        RunReport {
            final_state: run.current,
            history: run.history,
            restart_install_occurred: run.restart_install_occurred,
            installed,
        }
    }

    /// Install what the last snapshot reported unmet, in declared order.
    ///
    /// Each prerequisite is probed again right before installing, since an
    /// earlier install may already have provided it, and right after, so the
    /// run never moves on with an unverified prerequisite.
    fn install_unmet(&self, run: &mut RunState) -> Event {
        let unmet: Vec<String> = run
            .snapshot
            .as_ref()
            .map(|s| s.unmet().map(|r| r.name.clone()).collect())
            .unwrap_or_default();

        for spec in self
            .prerequisites
            .iter()
            .filter(|spec| unmet.contains(&spec.name))
        {
            if prereq::probe(self.runner, spec).is_satisfied() {
                continue;
            }

            match prereq::install(self.runner, spec) {
                Ok(InstallOutcome::RequiresManualStepThenRestart) => {
                    run.restart_install_occurred = true;
                    return Event::RestartRequired(RestartRequired::for_spec(spec));
                }
                Ok(InstallOutcome::Completed) => {
                    let after = prereq::probe(self.runner, spec);
                    if after.is_satisfied() {
                        ui::installed(&spec.name);
                        continue;
                    }
                    if !after.present && spec.shell_hint.is_some() {
                        run.restart_install_occurred = true;
                        return Event::RestartRequired(RestartRequired::for_spec(spec));
                    }
                    return Event::StepFailed(
                        InstallerError::InstallFailed {
                            name: spec.name.clone(),
                            reason: unmet_after_install(spec, &after),
                        }
                        .to_string(),
                    );
                }
                Err(e) => return Event::StepFailed(e.to_string()),
            }
        }

        Event::PrereqsReady
    }

    fn fetch(&self) -> Result<()> {
        let outcome = source::fetch(
            self.repository,
            &self.target.repository_url,
            &self.target.git_ref,
            &self.target.source_dir,
        )?;
        ui::fetched(outcome, &self.target.source_dir);
        Ok(())
    }
}
