use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Download and unpack pretrained model archives.
#[derive(Parser, Debug)]
#[command(name = "model-zoo")]
#[command(author, version, about)]
pub struct Args {
    /// Settings file to use instead of the platform config location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch the pretrained weights for an architecture into PATH
    Get {
        architecture: String,
        path: PathBuf,
        /// Keep the downloaded archive instead of unpacking it
        #[arg(long)]
        no_decompress: bool,
    },
    /// Print the download URL for an architecture
    Url { architecture: String },
    /// Print the effective settings
    Config {
        /// Write the effective settings back to the config file
        #[arg(long)]
        write: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_decompresses_by_default() {
        let args = Args::try_parse_from(["model-zoo", "get", "ResNet50", "/tmp/models"]).unwrap();
        assert!(!args.quiet);
        assert_eq!(
            args.command,
            Command::Get {
                architecture: "ResNet50".into(),
                path: PathBuf::from("/tmp/models"),
                no_decompress: false,
            }
        );
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "model-zoo",
            "get",
            "ResNet50",
            "out",
            "--no-decompress",
            "-q",
            "--config",
            "zoo.json",
        ])
        .unwrap();
        assert!(args.quiet);
        assert_eq!(args.config, Some(PathBuf::from("zoo.json")));
        assert!(matches!(args.command, Command::Get { no_decompress: true, .. }));
    }

    #[test]
    fn get_requires_a_path() {
        assert!(Args::try_parse_from(["model-zoo", "get", "ResNet50"]).is_err());
    }
}
