//! CLI argument parsing using clap derive API
//!
//! Purely declarative; no side effects or I/O.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// xray -- scan container images for vulnerabilities, concurrently.
///
/// Use `xray <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "xray", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace with streamed scanner output).
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan one or more images given on the command line.
    Image(ImageArgs),

    /// Scan every pod image in a Kubernetes namespace.
    Namespace(NamespaceArgs),

    /// Scan the images referenced by a helm chart.
    Helm(HelmArgs),

    /// Scan the images referenced in a YAML manifest file.
    Yaml(YamlArgs),

    /// Print version information.
    Version,
}

/// Flags shared by every scanning subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScanFlags {
    /// Run scans in offline mode (no server upload).
    #[arg(long = "blackduck.offline.mode")]
    pub offline_mode: bool,

    /// Black Duck server URL.
    #[arg(long = "blackduck.url", default_value = "")]
    pub server_url: String,

    /// Black Duck API token.
    #[arg(long = "blackduck.api.token", default_value = "")]
    pub api_token: String,

    /// Override for the project name. Without it, each image scans into a
    /// project named after the image.
    #[arg(long = "detect.project.name")]
    pub project_name: Option<String>,

    /// Tear down the shared image inspector services after the batch.
    /// Pass `--cleanup false` to keep them running for the next batch.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub cleanup: bool,

    /// Look up the latest released version of each image as advisory output.
    #[arg(long)]
    pub lookup_versions: bool,
}

// ---- image ----

/// Scan images passed as arguments.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image references (e.g. alpine:3.18, quay.io/org/app:1.2).
    #[arg(required = true)]
    pub images: Vec<String>,

    #[command(flatten)]
    pub scan: ScanFlags,
}

// ---- namespace ----

/// Scan all pod images in a namespace.
#[derive(Args, Debug)]
pub struct NamespaceArgs {
    /// Namespace to collect pod images from.
    pub namespace: String,

    #[command(flatten)]
    pub scan: ScanFlags,
}

// ---- helm ----

/// Scan the images a chart would deploy.
#[derive(Args, Debug)]
pub struct HelmArgs {
    /// Chart reference (repo/chart, local path, or URL).
    pub chart: String,

    #[command(flatten)]
    pub scan: ScanFlags,
}

// ---- yaml ----

/// Scan the images referenced by a manifest file.
#[derive(Args, Debug)]
pub struct YamlArgs {
    /// Path to the YAML manifest.
    pub file: PathBuf,

    #[command(flatten)]
    pub scan: ScanFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn image_subcommand_requires_at_least_one_image() {
        assert!(Cli::try_parse_from(["xray", "image"]).is_err());
        let cli = Cli::try_parse_from(["xray", "image", "alpine:3.18"]).unwrap();
        match cli.command {
            Commands::Image(args) => assert_eq!(args.images, vec!["alpine:3.18"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verbosity_is_counted_globally() {
        let cli = Cli::try_parse_from(["xray", "image", "alpine:3.18", "-vv"]).unwrap();
        assert_eq!(cli.verbosity, 2);
    }

    #[test]
    fn scan_flags_parse_with_dotted_names() {
        let cli = Cli::try_parse_from([
            "xray",
            "image",
            "alpine:3.18",
            "--blackduck.url",
            "https://bd.example",
            "--blackduck.api.token",
            "secret",
            "--detect.project.name",
            "my-project",
        ])
        .unwrap();
        match cli.command {
            Commands::Image(args) => {
                assert_eq!(args.scan.server_url, "https://bd.example");
                assert_eq!(args.scan.api_token, "secret");
                assert_eq!(args.scan.project_name.as_deref(), Some("my-project"));
                assert!(args.scan.cleanup);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cleanup_can_be_disabled() {
        let cli = Cli::try_parse_from([
            "xray",
            "namespace",
            "default",
            "--cleanup",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Namespace(args) => {
                assert_eq!(args.namespace, "default");
                assert!(!args.scan.cleanup);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
