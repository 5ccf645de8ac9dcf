//! Container-runtime actions.
//!
//! Two one-shot jobs that shell out to the container runtime and forward its
//! exit status:
//!
//! * [`CiJob`]: optional registry login, pull, then run a script in the image
//!   with the working directory mounted at `/ci/workdir`.
//! * [`PrivilegedJob`]: pull, then run a script with the host root filesystem
//!   and the runtime socket mounted into the container.
//!
//! Jobs only build [`Invocation`]s. Running them goes through a
//! [`CommandRunner`] so the command lines can be checked without a runtime.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, bail};
use async_trait::async_trait;
use netwait_common::success;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_RUNTIME: &str = "/usr/bin/docker";
pub const GITHUB_PACKAGES_REGISTRY: &str = "docker.pkg.github.com";

const SECRET_FLAGS: &[&str] = &["--password"];
const MASK: &str = "***";

/// One command line for the container runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        let mut masked: bool = false;
        for arg in &self.args {
            if masked {
                write!(f, " {MASK}")?;
            } else {
                write!(f, " {arg}")?;
            }
            masked = SECRET_FLAGS.contains(&arg.as_str());
        }
        Ok(())
    }
}

/// A bind mount, rendered as `--volume=<host>:<container>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub host: String,
    pub container: String,
}

impl Volume {
    pub fn new(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    fn workdir(dir: &Path, container: &str) -> Self {
        Self::new(dir.display().to_string(), container)
    }

    fn to_arg(&self) -> String {
        format!("--volume={}:{}", self.host, self.container)
    }
}

/// A script run by `/bin/bash -o errexit` inside a privileged, host-networked,
/// self-removing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub script: String,
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRuntime {
    pub binary: PathBuf,
}

impl Default for ContainerRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl ContainerRuntime {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: self.binary.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn login(&self, registry: &str, username: &str, password: &str) -> Invocation {
        self.invocation([
            "login",
            registry,
            "--username",
            username,
            "--password",
            password,
        ])
    }

    pub fn pull(&self, image: &str) -> Invocation {
        self.invocation(["pull", "--quiet", image])
    }

    pub fn run(&self, spec: &RunSpec) -> Invocation {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--net=host".into(),
            "--privileged".into(),
            "--rm".into(),
        ];
        args.extend(spec.volumes.iter().map(Volume::to_arg));
        args.push(spec.image.clone());
        args.extend(
            ["/bin/bash", "-o", "errexit", "-c"]
                .into_iter()
                .map(String::from),
        );
        args.push(spec.script.clone());
        self.invocation(args)
    }
}

/// A titled invocation, one section of a job's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub title: &'static str,
    pub invocation: Invocation,
}

/// Pull a CI image and run a script in it, logging in to GitHub Packages first
/// when a token is given.
#[derive(Debug, Clone)]
pub struct CiJob {
    pub actor: String,
    pub image: String,
    pub script: String,
    pub token: String,
    pub workdir: PathBuf,
}

impl CiJob {
    pub fn steps(&self, runtime: &ContainerRuntime) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::with_capacity(3);

        if !self.token.is_empty() {
            steps.push(Step {
                title: "Authenticate to GitHub Packages",
                invocation: runtime.login(GITHUB_PACKAGES_REGISTRY, &self.actor, &self.token),
            });
        }

        steps.push(Step {
            title: "Pull CI Image",
            invocation: runtime.pull(&self.image),
        });

        steps.push(Step {
            title: "Execute CI",
            invocation: runtime.run(&RunSpec {
                image: self.image.clone(),
                script: self.script.clone(),
                volumes: vec![
                    Volume::workdir(&self.workdir, "/ci/workdir"),
                    Volume::new("/lib/modules/", "/lib/modules/"),
                ],
            }),
        });

        steps
    }
}

/// Pull an image and run a script in it with the host filesystem and the
/// runtime socket available.
#[derive(Debug, Clone)]
pub struct PrivilegedJob {
    pub image: String,
    pub script: String,
    pub workdir: PathBuf,
}

impl PrivilegedJob {
    pub fn steps(&self, runtime: &ContainerRuntime) -> Vec<Step> {
        vec![
            Step {
                title: "Pull Image",
                invocation: runtime.pull(&self.image),
            },
            Step {
                title: "Execute Image",
                invocation: runtime.run(&RunSpec {
                    image: self.image.clone(),
                    script: self.script.clone(),
                    volumes: vec![
                        Volume::new("/", "/osb/host"),
                        Volume::workdir(&self.workdir, "/osb/workdir"),
                        Volume::new("/lib/modules/", "/lib/modules/"),
                        Volume::new("/var/run/docker.sock", "/var/run/docker.sock"),
                    ],
                }),
            },
        ]
    }
}

/// Runs a program to completion with the caller's standard streams.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<ExitStatus>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> anyhow::Result<ExitStatus> {
        Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("failed to spawn {}", invocation.program.display()))
    }
}

/// Runs `steps` in order, stopping at the first one that does not exit cleanly.
///
/// `on_step` announces each step before it starts.
pub async fn execute_steps<R, F>(runner: &R, steps: &[Step], on_step: F) -> anyhow::Result<()>
where
    R: CommandRunner + ?Sized,
    F: Fn(&Step),
{
    for step in steps {
        on_step(step);
        debug!("running: {}", step.invocation);

        let status: ExitStatus = runner.run(&step.invocation).await?;
        if !status.success() {
            match status.code() {
                Some(code) => bail!("{} failed with exit code {code}", step.title),
                None => bail!("{} was terminated by a signal", step.title),
            }
        }
        success!("{} finished", step.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::sync::Mutex;

    /// Records invocations and fails the call at `fail_at` (0-based).
    struct RecordingRunner {
        calls: Mutex<Vec<Invocation>>,
        fail_at: Option<usize>,
    }

    impl RecordingRunner {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation) -> anyhow::Result<ExitStatus> {
            let mut calls = self.calls.lock().unwrap();
            let index: usize = calls.len();
            calls.push(invocation.clone());
            let code: i32 = if Some(index) == self.fail_at { 3 } else { 0 };
            Ok(ExitStatus::from_raw(code << 8))
        }
    }

    fn ci_job(token: &str) -> CiJob {
        CiJob {
            actor: "octocat".into(),
            image: "ghcr.io/acme/ci:latest".into(),
            script: "make test".into(),
            token: token.into(),
            workdir: PathBuf::from("/home/runner/work"),
        }
    }

    #[test]
    fn ci_job_skips_login_without_token() {
        let steps: Vec<Step> = ci_job("").steps(&ContainerRuntime::default());
        let titles: Vec<&str> = steps.iter().map(|s| s.title).collect();
        assert_eq!(titles, ["Pull CI Image", "Execute CI"]);
    }

    #[test]
    fn ci_job_builds_login_pull_and_run() {
        let steps: Vec<Step> = ci_job("s3cret").steps(&ContainerRuntime::default());
        assert_eq!(steps.len(), 3);

        assert_eq!(
            steps[0].invocation.args,
            [
                "login",
                "docker.pkg.github.com",
                "--username",
                "octocat",
                "--password",
                "s3cret"
            ]
        );
        assert_eq!(
            steps[1].invocation.args,
            ["pull", "--quiet", "ghcr.io/acme/ci:latest"]
        );
        assert_eq!(
            steps[2].invocation.args,
            [
                "run",
                "--net=host",
                "--privileged",
                "--rm",
                "--volume=/home/runner/work:/ci/workdir",
                "--volume=/lib/modules/:/lib/modules/",
                "ghcr.io/acme/ci:latest",
                "/bin/bash",
                "-o",
                "errexit",
                "-c",
                "make test"
            ]
        );
        assert!(steps.iter().all(|s| s.invocation.program == Path::new(DEFAULT_RUNTIME)));
    }

    #[test]
    fn privileged_job_mounts_host_and_socket() {
        let job = PrivilegedJob {
            image: "osbuild/ci".into(),
            script: "./run.sh".into(),
            workdir: PathBuf::from("/src"),
        };
        let steps: Vec<Step> = job.steps(&ContainerRuntime::new("/usr/bin/podman"));

        assert_eq!(steps[0].invocation.args, ["pull", "--quiet", "osbuild/ci"]);
        let run: &Vec<String> = &steps[1].invocation.args;
        for volume in [
            "--volume=/:/osb/host",
            "--volume=/src:/osb/workdir",
            "--volume=/lib/modules/:/lib/modules/",
            "--volume=/var/run/docker.sock:/var/run/docker.sock",
        ] {
            assert!(run.iter().any(|a| a == volume), "missing {volume}");
        }
        assert_eq!(run.last().map(String::as_str), Some("./run.sh"));
        assert_eq!(steps[1].invocation.program, Path::new("/usr/bin/podman"));
    }

    #[test]
    fn display_masks_password() {
        let invocation: Invocation =
            ContainerRuntime::default().login("registry", "octocat", "s3cret");
        let shown: String = invocation.to_string();
        assert!(!shown.contains("s3cret"));
        assert!(shown.ends_with("--password ***"));
        assert!(shown.starts_with("/usr/bin/docker login registry --username octocat"));
    }

    #[tokio::test]
    async fn execute_steps_runs_every_step() {
        let runner = RecordingRunner::new(None);
        let steps: Vec<Step> = ci_job("token").steps(&ContainerRuntime::default());

        execute_steps(&runner, &steps, |_| {}).await.unwrap();
        assert_eq!(runner.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn execute_steps_stops_at_first_failure() {
        let runner = RecordingRunner::new(Some(0));
        let steps: Vec<Step> = ci_job("bad-token").steps(&ContainerRuntime::default());

        let err = execute_steps(&runner, &steps, |_| {}).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authenticate to GitHub Packages failed with exit code 3"
        );
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn each_step_is_announced_once() {
        let runner = RecordingRunner::new(None);
        let steps: Vec<Step> = ci_job("token").steps(&ContainerRuntime::default());
        let announced: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        execute_steps(&runner, &steps, |step| announced.lock().unwrap().push(step.title))
            .await
            .unwrap();

        assert_eq!(
            announced.into_inner().unwrap(),
            ["Authenticate to GitHub Packages", "Pull CI Image", "Execute CI"]
        );
    }

    #[tokio::test]
    async fn process_runner_forwards_exit_status() {
        let runner = ProcessRunner;
        let ok = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "exit 0".into()],
        };
        let failing = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "exit 7".into()],
        };

        assert!(runner.run(&ok).await.unwrap().success());
        assert_eq!(runner.run(&failing).await.unwrap().code(), Some(7));
    }

    #[tokio::test]
    async fn process_runner_reports_missing_binary() {
        let missing = Invocation {
            program: PathBuf::from("/nonexistent/docker"),
            args: vec!["pull".into()],
        };
        let err = ProcessRunner.run(&missing).await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn /nonexistent/docker"));
    }
}
