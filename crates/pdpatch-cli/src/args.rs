//! Command-line argument definitions for the pdpatch CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input and output documents, the
//! configuration file, the arranger and the logging verbosity. Document
//! formats follow the file extensions (`.pd`, `.json`, `.xml`).

use clap::Parser;

/// Command-line arguments for the pdpatch tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input patch or document
    #[arg(help = "Path to the input file (.pd, .json or .xml)")]
    pub input: String,

    /// Path to the output document
    #[arg(short, long, default_value = "out.pd")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Place unpositioned nodes before writing, regardless of the configuration
    #[arg(long)]
    pub arrange: bool,

    /// Patch name; defaults to the input file stem
    #[arg(long)]
    pub name: Option<String>,
}
