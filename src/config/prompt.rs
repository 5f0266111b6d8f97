use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

use crate::models::case::BodyRegion;

pub const PERSONA_PROMPT_VERSION: &str = "kinbot-persona-v1";

/// System instruction sent with every turn. Keeps the model in the role of
/// the patient and out of clinical language.
pub const PERSONA_INSTRUCTION: &str = "\
Eres un paciente virtual que simula un caso clínico musculoesquelético.
Tu rol es responder como si fueras el paciente, en primera persona, sin salir del personaje.
El estudiante que te consulta es un kinesiólogo que está realizando una entrevista clínica.

Tu objetivo es simular de manera coherente y realista el relato de un paciente con dolor musculoesquelético.
Cuando el kinesiólogo haga preguntas clínicas, debes:
- Interpretar si es una pregunta de anamnesis, exploración o diagnóstico.
- Responder en base al tipo de pregunta, sin analizar la situación clínicamente como IA.
- No explicar tus respuestas desde el punto de vista fisiológico o patológico, solo como paciente.
- Mantener el tono conversacional de alguien que acude a una consulta de kinesiología.

Ejemplo:
- Si pregunta “¿Desde cuándo tiene el dolor?” → responde con tiempo y contexto.
- Si pregunta “¿Qué pasa si se agacha?” → describe el dolor, sin usar lenguaje médico.
- Si da un diagnóstico → puedes decir si lo entiendes, si te preocupa, etc.

No rompas el personaje nunca.";

pub const BODY_REGION_PLACEHOLDER: &str = "{body_region}";

/// Prompt sent once per session to invent the case.
pub const CASE_GENERATION_TEMPLATE: &str = "\
Genera un caso clínico de fisioterapia musculoesquelética.
Simula a un paciente con dolor en la zona de {body_region}.
Incluye nombre, edad, sexo y ocupación del paciente.
Preséntate como el paciente, en primera persona, describiendo el motivo de consulta y el inicio del dolor.
No salgas del personaje de paciente.";

pub const FALLBACK_REPLY: &str = "No entendí tu pregunta.";

#[derive(Debug)]
pub enum PromptError {
    MissingPlaceholder(String),
    EmptyField(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::MissingPlaceholder(key) =>
                write!(f, "Prompt template '{}' is missing the {} placeholder", key, BODY_REGION_PLACEHOLDER),
            PromptError::EmptyField(key) => write!(f, "Prompt field '{}' is empty", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

fn default_version() -> String {
    PERSONA_PROMPT_VERSION.to_string()
}

fn default_persona_instruction() -> String {
    PERSONA_INSTRUCTION.to_string()
}

fn default_case_template() -> String {
    CASE_GENERATION_TEMPLATE.to_string()
}

fn default_fallback_reply() -> String {
    FALLBACK_REPLY.to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_persona_instruction")]
    pub persona_instruction: String,
    #[serde(default = "default_case_template")]
    pub case_generation_template: String,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            persona_instruction: default_persona_instruction(),
            case_generation_template: default_case_template(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.persona_instruction.trim().is_empty() {
            return Err(PromptError::EmptyField("persona_instruction".to_string()));
        }
        if self.fallback_reply.trim().is_empty() {
            return Err(PromptError::EmptyField("fallback_reply".to_string()));
        }
        if !self.case_generation_template.contains(BODY_REGION_PLACEHOLDER) {
            return Err(PromptError::MissingPlaceholder("case_generation_template".to_string()));
        }
        Ok(())
    }

    pub fn case_prompt(&self, region: BodyRegion) -> String {
        self.case_generation_template.replace(BODY_REGION_PLACEHOLDER, region.label())
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config = load_prompts_from_str(&file_content)?;
    info!("Loaded prompts '{}' from {}", config.version, path.as_ref().display());
    Ok(Arc::new(config))
}

/// Built-in prompts unless a prompts file is configured.
pub fn resolve_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => {
            info!("Using built-in prompts '{}'", PERSONA_PROMPT_VERSION);
            Ok(Arc::new(PromptConfig::default()))
        }
    }
}
