//! Boundary to the rendering collaborator, plus the end-to-end pipeline.
//!
//! The renderer executes generated code with filesystem side effects, so
//! every invocation gets its own disposable working directory. Cleanup on
//! every exit path is carried by `TempDir` ownership: the directory lives
//! exactly as long as the value that owns it.

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::generator::{generate_diagram_code, CodeGenerator, GenerateError, GeneratorConfig};
use crate::repair::RepairEngine;
use crate::vocabulary::Vocabulary;

/// Execute `program` inside `workdir` and return the path of the produced
/// artifact. Failure reasons are surfaced verbatim to the caller.
pub trait DiagramRenderer {
    fn execute(&self, program: &str, workdir: &Path) -> Result<PathBuf, String>;
}

#[derive(Debug)]
pub enum RenderError {
    /// The program referenced a component the renderer does not export.
    /// Carries the exact offending symbol so the user can retry or
    /// rephrase.
    InvalidComponent { symbol: String },
    MissingArtifact { path: PathBuf },
    Execution(String),
    Workdir(std::io::Error),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::InvalidComponent { symbol } => write!(
                f,
                "'{}' is not a valid component; regenerate or simplify the request",
                symbol
            ),
            RenderError::MissingArtifact { path } => {
                write!(f, "renderer reported success but {} does not exist", path.display())
            }
            RenderError::Execution(reason) => write!(f, "renderer failed: {}", reason),
            RenderError::Workdir(err) => write!(f, "could not create working directory: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Workdir(err) => Some(err),
            _ => None,
        }
    }
}

static MISSING_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cannot import name '(\w+)'").unwrap());

fn interpret_failure(reason: String) -> RenderError {
    match MISSING_IMPORT.captures(&reason) {
        Some(captures) => RenderError::InvalidComponent {
            symbol: captures[1].to_string(),
        },
        None => RenderError::Execution(reason),
    }
}

/// Run the renderer in a fresh disposable working directory.
///
/// On failure the directory is removed before returning; on success the
/// caller receives ownership of it alongside the artifact path, so the
/// artifact stays readable until the pair is dropped.
pub fn render_program<R: DiagramRenderer>(
    renderer: &R,
    program: &str,
) -> Result<(TempDir, PathBuf), RenderError> {
    let workdir = tempfile::tempdir().map_err(RenderError::Workdir)?;
    let artifact = renderer
        .execute(program, workdir.path())
        .map_err(interpret_failure)?;
    if !artifact.exists() {
        return Err(RenderError::MissingArtifact { path: artifact });
    }
    Ok((workdir, artifact))
}

#[derive(Debug)]
pub enum PipelineError {
    Generation(GenerateError),
    Render(RenderError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Generation(err) => write!(f, "{}", err),
            PipelineError::Render(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Generation(err) => Some(err),
            PipelineError::Render(err) => Some(err),
        }
    }
}

impl From<GenerateError> for PipelineError {
    fn from(err: GenerateError) -> Self {
        PipelineError::Generation(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

/// A successfully rendered diagram. Dropping it removes the working
/// directory and the artifact with it.
#[derive(Debug)]
pub struct RenderedDiagram {
    code: String,
    artifact: PathBuf,
    _workdir: TempDir,
}

impl RenderedDiagram {
    /// The repaired program text that produced the artifact.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

/// description -> prompt -> generate (bounded retry) -> repair -> render.
pub struct Pipeline<G, R> {
    generator: G,
    renderer: R,
    engine: RepairEngine,
    config: GeneratorConfig,
}

impl<G: CodeGenerator, R: DiagramRenderer> Pipeline<G, R> {
    pub fn new(generator: G, renderer: R) -> Self {
        Pipeline::with_vocabulary(generator, renderer, Vocabulary::builtin())
    }

    pub fn with_vocabulary(generator: G, renderer: R, vocabulary: Arc<Vocabulary>) -> Self {
        Pipeline {
            generator,
            renderer,
            engine: RepairEngine::new(vocabulary),
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run(&self, description: &str) -> Result<RenderedDiagram, PipelineError> {
        let code =
            generate_diagram_code(&self.generator, &self.engine, description, &self.config)?;
        let (workdir, artifact) = render_program(&self.renderer, &code)?;
        info!("diagram rendered at {}", artifact.display());
        Ok(RenderedDiagram {
            code,
            artifact,
            _workdir: workdir,
        })
    }
}
