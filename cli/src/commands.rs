pub mod container;
pub mod wait;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use netwait_core::container::DEFAULT_RUNTIME;

/// Every action input can also come from the `INPUT_<NAME>` variable a CI
/// runner sets for action inputs.
#[derive(Parser)]
#[command(name = "netwait")]
#[command(version, about = "Wait for TCP services and run CI containers.")]
pub struct CommandLine {
    /// Reduce output; repeat for less
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Block until a host accepts TCP connections on a port
    #[command(alias = "w")]
    Wait(WaitArgs),
    /// Pull a CI image and run a script inside it
    Ci(CiArgs),
    /// Run a script in a privileged container with the host mounted
    #[command(alias = "priv")]
    Privileged(PrivilegedArgs),
}

#[derive(Args)]
pub struct WaitArgs {
    /// Hostname or IP literal to probe
    #[arg(long, env = "INPUT_HOST")]
    pub host: String,

    /// TCP port to probe
    #[arg(long, env = "INPUT_PORT")]
    pub port: String,

    /// Seconds to keep trying; 0 probes exactly once
    #[arg(long, env = "INPUT_TIMEOUT")]
    pub timeout: String,

    /// Pause between failed probes, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 200)]
    pub interval_ms: u64,

    /// Upper bound for a single probe, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 3000)]
    pub probe_timeout_ms: u64,

    /// Keep retrying on unexpected probe errors instead of failing
    #[arg(long, env = "INPUT_LENIENT")]
    pub lenient: bool,
}

#[derive(Args)]
pub struct RuntimeArgs {
    /// Container runtime binary
    #[arg(long, env = "NETWAIT_RUNTIME", default_value = DEFAULT_RUNTIME)]
    pub runtime: PathBuf,
}

#[derive(Args)]
pub struct CiArgs {
    /// User name for the registry login
    #[arg(long, env = "INPUT_ACTOR", default_value = "")]
    pub actor: String,

    /// Image to pull and run
    #[arg(long, env = "INPUT_IMAGE")]
    pub image: String,

    /// Script passed to `bash -o errexit -c`
    #[arg(long, env = "INPUT_RUN")]
    pub run: String,

    /// Registry token; login is skipped when empty
    #[arg(long, env = "INPUT_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

#[derive(Args)]
pub struct PrivilegedArgs {
    /// Image to pull and run
    #[arg(long, env = "INPUT_IMAGE")]
    pub image: String,

    /// Script passed to `bash -o errexit -c`
    #[arg(long, env = "INPUT_RUN")]
    pub run: String,

    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
