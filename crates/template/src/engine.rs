//! Fill engine
//!
//! Chooses how a template is turned into a PDF. With a background document
//! the engine walks a fixed chain of strategies, each attempted at most
//! once, and returns the first one that yields a complete document:
//!
//! 1. [`Strategy::NativeFill`]: fill the background's own form fields
//! 2. [`Strategy::PrimaryMerge`]: overlay merged by content append (flattens)
//! 3. [`Strategy::SecondaryMerge`]: overlay stamped as a Form XObject, then
//!    an explicit flatten pass
//! 4. [`Strategy::Standalone`]: self-contained page, background ignored
//!
//! Without a usable background the engine goes straight to `Standalone`.
//! Only a failure of that last state reaches the caller.

use crate::compositor::PageCompositor;
use crate::config::{Clock, EngineConfig, SystemClock};
use crate::native::fill_native_fields;
use crate::renderer::RenderMode;
use crate::schema::Template;
use crate::{Result, TemplateError};
use log::{debug, info, warn};
use pdf_core::{flatten, ContentAppendMerge, FormXObjectMerge, MergeBackend};
use serde_json::Value;
use std::path::Path;

/// One state of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NativeFill,
    PrimaryMerge,
    SecondaryMerge,
    Standalone,
}

impl Strategy {
    /// State tried when this one fails; `None` after `Standalone`
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NativeFill => Some(Self::PrimaryMerge),
            Self::PrimaryMerge => Some(Self::SecondaryMerge),
            Self::SecondaryMerge => Some(Self::Standalone),
            Self::Standalone => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NativeFill => "native fill",
            Self::PrimaryMerge => "primary merge",
            Self::SecondaryMerge => "secondary merge",
            Self::Standalone => "standalone",
        };
        f.write_str(name)
    }
}

/// A finished document and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub strategy: Strategy,
}

/// Outcome of a single strategy attempt
enum Attempt {
    Done(Vec<u8>),
    NotApplicable,
}

/// Renders templates, falling back through [`Strategy`] states
pub struct FillEngine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    primary: Box<dyn MergeBackend>,
    secondary: Box<dyn MergeBackend>,
}

impl Default for FillEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FillEngine {
    /// Engine with default configuration, the system clock and the
    /// built-in merge back-ends
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: Box::new(SystemClock),
            primary: Box::new(ContentAppendMerge),
            secondary: Box::new(FormXObjectMerge),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use another time source for the stand-alone header
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the merge back-ends
    ///
    /// The secondary back-end's output is always flattened afterwards.
    pub fn with_backends(
        mut self,
        primary: Box<dyn MergeBackend>,
        secondary: Box<dyn MergeBackend>,
    ) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self
    }

    fn compositor<'a>(&'a self, template: &'a Template) -> PageCompositor<'a> {
        PageCompositor::new(template)
            .with_clock(self.clock.as_ref())
            .with_config(&self.config)
    }

    /// Render a template, using a background PDF on disk if available
    ///
    /// `background` takes priority over the template's own
    /// `pdfFilePath`. A path that does not exist or cannot be read leads
    /// straight to a stand-alone render.
    pub fn render(
        &self,
        template: &Template,
        data: &Value,
        background: Option<&Path>,
    ) -> Result<Rendered> {
        let path = background.or_else(|| template.background_path.as_deref().map(Path::new));

        let bytes = match path {
            Some(path) if path.is_file() => match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Cannot read background {}: {e}", path.display());
                    None
                }
            },
            Some(path) => {
                debug!("Background {} does not exist", path.display());
                None
            }
            None => None,
        };

        self.render_with_background(template, data, bytes.as_deref())
    }

    /// Render a template over an in-memory background PDF
    pub fn render_with_background(
        &self,
        template: &Template,
        data: &Value,
        background: Option<&[u8]>,
    ) -> Result<Rendered> {
        let mut state = match background {
            Some(_) if self.config.native_fill => Strategy::NativeFill,
            Some(_) => Strategy::PrimaryMerge,
            None => Strategy::Standalone,
        };
        let mut overlay: Option<Vec<u8>> = None;

        loop {
            debug!("Trying {state} for '{}'", template.name);
            let outcome = self.attempt(state, template, data, background, &mut overlay);

            match outcome {
                Ok(Attempt::Done(bytes)) => {
                    info!(
                        "Rendered '{}' via {state} ({} bytes)",
                        template.name,
                        bytes.len()
                    );
                    return Ok(Rendered {
                        bytes,
                        strategy: state,
                    });
                }
                Ok(Attempt::NotApplicable) => debug!("{state} not applicable"),
                Err(e) if state == Strategy::Standalone => {
                    return Err(TemplateError::Generation(e.to_string()));
                }
                Err(e) => warn!("{state} failed: {e}"),
            }

            state = match state.next() {
                Some(next) => next,
                None => {
                    return Err(TemplateError::Generation(
                        "no strategy produced a document".to_string(),
                    ))
                }
            };
        }
    }

    fn attempt(
        &self,
        state: Strategy,
        template: &Template,
        data: &Value,
        background: Option<&[u8]>,
        overlay: &mut Option<Vec<u8>>,
    ) -> Result<Attempt> {
        if state == Strategy::Standalone {
            let bytes = self
                .compositor(template)
                .composite(data, RenderMode::Standalone)?;
            return Ok(Attempt::Done(bytes));
        }

        let Some(background) = background else {
            return Ok(Attempt::NotApplicable);
        };

        if state == Strategy::NativeFill {
            return Ok(match fill_native_fields(background, template, data) {
                Some(bytes) => Attempt::Done(bytes),
                None => Attempt::NotApplicable,
            });
        }

        if overlay.is_none() {
            let rendered = self
                .compositor(template)
                .composite(data, RenderMode::OverlayTransparent)?;
            *overlay = Some(rendered);
        }
        let Some(overlay) = overlay.as_deref() else {
            return Ok(Attempt::NotApplicable);
        };

        let bytes = if state == Strategy::PrimaryMerge {
            debug!("Merging with {}", self.primary.name());
            self.primary.merge(background, overlay)?
        } else {
            debug!("Merging with {}", self.secondary.name());
            let merged = self.secondary.merge(background, overlay)?;
            flatten(&merged)?
        };
        Ok(Attempt::Done(bytes))
    }
}
