//! CLI logic for the pdpatch tool.
//!
//! Reads a patch or a structured document, optionally arranges it and
//! writes it in the format named by the output extension.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::{debug, info};

use pdpatch::{Format, PatchBuilder, PdPatchError};

/// Run the pdpatch CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `PdPatchError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Unknown encodings and text the output encoding cannot represent
/// - Unsupported file extensions
/// - Parsing and document errors
pub fn run(args: &Args) -> Result<(), PdPatchError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Converting patch"
    );

    let input_format = Format::from_path(&args.input)?;
    let output_format = Format::from_path(&args.output)?;

    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.arrange {
        app_config = app_config.with_arrange_enabled(true);
    }

    let builder = PatchBuilder::new(app_config);
    let source = builder.decode(&fs::read(&args.input)?)?;
    let name = patch_name(args);
    debug!(name, format:% = input_format; "Reading input");

    let mut patch = builder.read(&source, &name, input_format)?;
    if builder.config().arrange().enabled() {
        builder.arrange(&mut patch)?;
    }

    let text = builder.write(&patch, output_format)?;
    fs::write(&args.output, builder.encode(&patch, &text)?)?;

    info!(output_file = args.output, format:% = output_format; "Patch written successfully");

    Ok(())
}

/// The explicit name, or the input file stem.
fn patch_name(args: &Args) -> String {
    args.name.clone().unwrap_or_else(|| {
        Path::new(&args.input)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}
