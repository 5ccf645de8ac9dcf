use std::path::PathBuf;

use anyhow::Context;
use netwait_common::config::Config;
use netwait_core::container::{
    self, CiJob, ContainerRuntime, PrivilegedJob, ProcessRunner, Step,
};

use crate::commands::{CiArgs, PrivilegedArgs};
use crate::terminal::print;

pub async fn ci(args: CiArgs, cfg: &Config) -> anyhow::Result<()> {
    let job = CiJob {
        actor: args.actor,
        image: args.image,
        script: args.run,
        token: args.token,
        workdir: current_dir()?,
    };
    let runtime = ContainerRuntime::new(args.runtime.runtime);

    run_steps(&job.steps(&runtime), cfg).await?;
    print::header("end of ci", cfg.quiet);
    Ok(())
}

pub async fn privileged(args: PrivilegedArgs, cfg: &Config) -> anyhow::Result<()> {
    let job = PrivilegedJob {
        image: args.image,
        script: args.run,
        workdir: current_dir()?,
    };
    let runtime = ContainerRuntime::new(args.runtime.runtime);

    run_steps(&job.steps(&runtime), cfg).await?;
    print::header("end of execution", cfg.quiet);
    Ok(())
}

/// Runs the steps, each inside its own header-delimited section.
async fn run_steps(steps: &[Step], cfg: &Config) -> anyhow::Result<()> {
    container::execute_steps(&ProcessRunner, steps, |step: &Step| {
        print::header(step.title, cfg.quiet)
    })
    .await
}

fn current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("cannot determine the working directory")
}
