//! Loading agent configuration (prompts + storage) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub storage: StorageCfg,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StorageCfg {
  /// Directory holding the score file. Overridden by SCORE_DIR.
  #[serde(default)]
  pub score_dir: Option<PathBuf>,
}

/// Prompts used by the OpenAI client. Defaults target B1 learners of Spanish.
/// You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Shared by every call.
  pub system_instruction: String,
  /// `{seed}` is replaced with a random number to discourage repeats.
  pub conjugation_user: String,
  pub trigger_user: String,
  pub sentence_user: String,
  /// `{context}`, `{trigger}`, `{answer}`.
  pub sentence_eval_user: String,
  pub puzzle_user: String,
  pub error_user: String,
  pub roleplay_user: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system_instruction: "Eres un profesor experto de ELE (Español como Lengua Extranjera) especializado en enseñar el subjuntivo a estudiantes de nivel B1 que hablan lenguas no románicas.\nTu tono es alentador, claro, colorido y divertido.\nIMPORTANTE: NUNCA uses Markdown. Usa SOLAMENTE etiquetas HTML simples (<b>, <i>, <br>, <span>) para formatear el texto.\nTus explicaciones deben ayudar a entender el concepto de \"Mundo Real (Indicativo)\" vs \"Mundo Subjetivo/No Real (Subjuntivo)\".".into(),
      conjugation_user: "Genera un nuevo y aleatorio ejercicio de conjugación de subjuntivo para nivel B1 (seed: {seed}). Prioriza verbos irregulares comunes (ser, ir, tener, saber) o cambios de raíz (querer, pedir).\nDevuelve SOLO JSON: {\"verb\": string, \"mood\": \"Subjuntivo\", \"person\": string, \"tense\": \"Presente\" | \"Imperfecto\", \"correctForm\": string, \"hint\": string (pista breve en HTML)}.".into(),
      trigger_user: "Genera una frase incompleta donde el estudiante debe elegir entre Indicativo o Subjuntivo. Céntrate en contrastes claros: 'Creo que...' vs 'No creo que...', 'Es verdad que...' vs 'Es posible que...'.\nDevuelve SOLO JSON: {\"sentenceStart\": string (la frase con un hueco '___'), \"triggerType\": string (Duda, Emoción, Certeza...), \"options\": [{\"text\": string, \"isCorrect\": boolean, \"explanation\": string (HTML breve)}]}.".into(),
      sentence_user: "Genera un escenario para construir una frase en subjuntivo. Da 3 opciones de verbos en infinitivo, solo uno tiene sentido lógico en el contexto.\nDevuelve SOLO JSON: {\"context\": string, \"trigger\": string (ej. Espero que...), \"verbOptions\": [3 infinitivos], \"correctVerbInfinitive\": string, \"targetTranslation\": string (inglés)}.".into(),
      sentence_eval_user: "Contexto: \"{context}\". Frase completa intentada: \"{trigger} {answer}\". Evalúa si el verbo está bien conjugado en subjuntivo y si la frase tiene sentido.\nDevuelve SOLO JSON: {\"isCorrect\": boolean, \"feedback\": string (explicación pedagógica en HTML), \"correction\": string (la frase completa correcta)}.".into(),
      puzzle_user: "Genera una oración interesante usando subjuntivo (nivel B1). Devuelve la oración completa y una lista de sus palabras desordenadas.\nDevuelve SOLO JSON: {\"originalSentence\": string, \"scrambledWords\": [string], \"translation\": string (inglés)}.".into(),
      error_user: "Genera un ejercicio de 'Encuentra el error'. Da dos frases muy parecidas sobre un mismo contexto: una correcta (usando subjuntivo/indicativo apropiadamente) y otra con un error gramatical común de estudiantes B1.\nDevuelve SOLO JSON: {\"context\": string, \"options\": [{\"id\": integer, \"text\": string, \"isCorrect\": boolean}], \"explanation\": string (HTML)}.".into(),
      roleplay_user: "Genera un escenario corto de rol (roleplay) para practicar el subjuntivo (ej. aconsejar a un amigo, planear una fiesta sorpresa, expresar deseos para el futuro). Da una primera frase para iniciar la conversación.\nDevuelve SOLO JSON: {\"scenario\": string, \"teacherPrompt\": string}.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "subjuntivo_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "subjuntivo_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "subjuntivo_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// SCORE_DIR, then the TOML value, then the platform data dir.
pub fn resolve_score_dir(cfg: &AgentConfig) -> PathBuf {
  std::env::var("SCORE_DIR")
    .ok()
    .filter(|s| !s.trim().is_empty())
    .map(PathBuf::from)
    .or_else(|| cfg.storage.score_dir.clone())
    .unwrap_or_else(crate::scoring::FileStore::default_dir)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_default_prompts() {
    let cfg: AgentConfig = toml::from_str(
      r#"
        [prompts]
        puzzle_user = "Frase corta con ojalá."

        [storage]
        score_dir = "/tmp/subjuntivo-test"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.puzzle_user, "Frase corta con ojalá.");
    assert_eq!(cfg.prompts.conjugation_user, Prompts::default().conjugation_user);
    assert_eq!(cfg.storage.score_dir, Some(PathBuf::from("/tmp/subjuntivo-test")));
  }

  #[test]
  fn default_templates_carry_their_placeholders() {
    let p = Prompts::default();
    assert!(p.conjugation_user.contains("{seed}"));
    for key in ["{context}", "{trigger}", "{answer}"] {
      assert!(p.sentence_eval_user.contains(key));
    }
  }
}
