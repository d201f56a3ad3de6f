//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::codec::Format;

/// Flat text wire format for UI widget trees: encode, decode, verify
#[derive(Parser, Debug)]
#[command(name = "uiwire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (repeat for more: -d -d -d)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Wire format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<Format>,

    /// Additional config file, applied over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a TOML widget description into a buffer
    Encode {
        /// Description file
        #[arg(value_hint = ValueHint::FilePath)]
        description: PathBuf,
    },

    /// Decode a buffer and print the tree
    Decode {
        /// Buffer file ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        buffer: PathBuf,
        /// Print the tree as a TOML description instead of the compact form
        #[arg(long)]
        toml: bool,
    },

    /// Verify that buffers decode and re-encode byte for byte
    Check {
        /// Buffer files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        buffers: Vec<PathBuf>,
    },

    /// Encode the built-in "Application" sample tree
    Demo,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show global config path
    Path,

    /// Print config template
    Init,
}
