//! Configuration types for patch conversion.
//!
//! This module provides the configuration structures that control how
//! patches are arranged and written. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining arrange and output settings.
//! - [`ArrangeConfig`] - Controls the auto-arranger: spacing, margin and whether it runs.
//! - [`OutputConfig`] - Controls the written document, such as its declared encoding.
//!
//! # Example
//!
//! ```
//! # use pdpatch::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.arrange().enabled());
//! assert_eq!(config.output().encoding(), "utf-8");
//! ```

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Auto-arranger section.
    #[serde(default)]
    arrange: ArrangeConfig,

    /// Output section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(arrange: ArrangeConfig, output: OutputConfig) -> Self {
        Self { arrange, output }
    }

    /// Returns the arranger configuration.
    pub fn arrange(&self) -> &ArrangeConfig {
        &self.arrange
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Returns a copy with the arranger switched on or off.
    pub fn with_arrange_enabled(mut self, enabled: bool) -> Self {
        self.arrange.enabled = enabled;
        self
    }

    /// Returns a copy that reads and writes documents in `encoding`.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.output.encoding = encoding.into();
        self
    }
}

/// Auto-arranger configuration.
///
/// Steps are multiples of the largest node size of a canvas; the margin is
/// the position of the first placed node.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArrangeConfig {
    enabled: bool,
    force: bool,
    hstep: f32,
    vstep: f32,
    margin_x: f32,
    margin_y: f32,
}

impl Default for ArrangeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            force: false,
            hstep: 1.25,
            vstep: 1.0,
            margin_x: 10.0,
            margin_y: 10.0,
        }
    }
}

impl ArrangeConfig {
    /// Run the arranger before writing pd text.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Discard existing positions and arrange every node.
    pub fn force(&self) -> bool {
        self.force
    }

    pub fn hstep(&self) -> f32 {
        self.hstep
    }

    pub fn vstep(&self) -> f32 {
        self.vstep
    }

    pub fn margin_x(&self) -> f32 {
        self.margin_x
    }

    pub fn margin_y(&self) -> f32 {
        self.margin_y
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_steps(mut self, hstep: f32, vstep: f32) -> Self {
        self.hstep = hstep;
        self.vstep = vstep;
        self
    }

    pub fn with_margin(mut self, margin_x: f32, margin_y: f32) -> Self {
        self.margin_x = margin_x;
        self.margin_y = margin_y;
        self
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Encoding label used to decode input, recorded on parsed patches and
    /// used for the bytes and declaration of written documents.
    encoding: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}
