//! diagen: natural-language architecture descriptions in, rendered
//! diagrams out.
//!
//! A generative-model collaborator emits diagram-building code against a
//! fixed component vocabulary; the repair engine then rewrites every
//! namespaced reference in that code to a valid, correctly-cased symbol
//! before the renderer collaborator executes it. The engine never fails on
//! bad input: worst case the text comes back unchanged and the renderer's
//! error names the offending symbol.

pub mod corrections;
pub mod generator;
pub mod import_scanner;
pub mod prompt;
pub mod renderer;
pub mod repair;
pub mod similarity;
pub mod vocabulary;

pub use generator::{generate_diagram_code, CodeGenerator, GenerateError, GeneratorConfig};
pub use import_scanner::{ImportReference, ScanError};
pub use renderer::{
    render_program, DiagramRenderer, Pipeline, PipelineError, RenderError, RenderedDiagram,
};
pub use repair::{AppliedFix, RepairEngine};
pub use vocabulary::Vocabulary;
