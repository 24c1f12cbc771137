use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the courier-intake binary.
#[derive(Debug, Parser)]
#[command(
    name = "courier-intake",
    version,
    about = "Courier scan-intake coordination core"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "COURIER_INTAKE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Issue label uuids with paired tracking numbers.
    Mint(MintArgs),
    /// Run frame files through the intake state machine.
    Scan(ScanArgs),
}

#[derive(Debug, Args, Clone)]
pub struct MintArgs {
    /// Number of identifier pairs to issue.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// Frame files, one frame per file.
    #[arg(value_name = "FILE", required = true, value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// How frame files are read.
    #[arg(long = "format", value_enum, default_value_t = FrameFormat::Image)]
    pub format: FrameFormat,

    /// Caller identity used by the admission gate.
    #[arg(long = "caller", value_name = "ID", default_value = "local")]
    pub caller: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrameFormat {
    /// PNG or JPEG camera images carrying a QR code.
    Image,
    /// Text already extracted by an external QR reader.
    Text,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the vision service endpoint.
    #[arg(long = "vision-endpoint", value_name = "URL", global = true)]
    pub vision_endpoint: Option<String>,

    /// Override the vision model name.
    #[arg(long = "vision-model", value_name = "MODEL", global = true)]
    pub vision_model: Option<String>,

    /// Override the vision call timeout.
    #[arg(long = "vision-timeout-ms", value_name = "MILLIS", global = true)]
    pub vision_timeout_ms: Option<u64>,

    /// Override the per-caller admission cooldown.
    #[arg(long = "admission-cooldown-ms", value_name = "MILLIS", global = true)]
    pub admission_cooldown_ms: Option<u64>,
}
