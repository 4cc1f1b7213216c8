//! Boundary to the generative-model collaborator: bounded retry around an
//! opaque text-in/text-out call, fence extraction, then repair.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::prompt;
use crate::repair::RepairEngine;

/// One model call. Implementations wrap whatever backend produces the
/// diagram code; transient failures are reported as `Err` and retried by
/// [`generate_diagram_code`].
pub trait CodeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, String>;
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Retries after the first attempt. Bounded retry with no backoff.
    pub max_retries: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig { max_retries: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The collaborator failed on every attempt; the last cause is kept.
    Upstream { attempts: usize, cause: String },
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Upstream { attempts, cause } => {
                write!(f, "generation failed after {} attempts: {}", attempts, cause)
            }
        }
    }
}

impl std::error::Error for GenerateError {}

static PYTHON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```python\n(.*?)\n```").unwrap());
static BARE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```\n(.*?)\n```").unwrap());

/// Pull the program text out of a model response: a ```python fence wins,
/// then a bare ``` fence, else the whole response.
pub fn extract_code_block(response: &str) -> &str {
    if let Some(captures) = PYTHON_FENCE.captures(response) {
        if let Some(code) = captures.get(1) {
            return code.as_str();
        }
    }
    if let Some(captures) = BARE_FENCE.captures(response) {
        if let Some(code) = captures.get(1) {
            return code.as_str();
        }
    }
    response.trim()
}

/// Generate diagram code for `description`: prompt, call the collaborator
/// (retrying up to the configured bound), extract the fenced program, and
/// repair it. The returned text is ready for the renderer.
pub fn generate_diagram_code<G: CodeGenerator>(
    generator: &G,
    engine: &RepairEngine,
    description: &str,
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let prompt = prompt::build_generation_prompt(engine.vocabulary(), description);

    let mut attempts = 0;
    let response = loop {
        attempts += 1;
        match generator.generate(&prompt) {
            Ok(response) => break response,
            Err(cause) if attempts <= config.max_retries => {
                warn!("generation attempt {} failed: {}", attempts, cause);
            }
            Err(cause) => return Err(GenerateError::Upstream { attempts, cause }),
        }
    };

    let code = extract_code_block(&response);
    Ok(engine.repair(code).trim().to_string())
}
