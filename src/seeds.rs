//! Built-in static content: the home-screen catalog and the Trigger Detective
//! concept cards. Practice rounds themselves always come from the model.

use crate::domain::Mode;

pub struct ModeCard {
  pub mode: Mode,
  pub title: &'static str,
  pub description: &'static str,
}

pub const MODE_CATALOG: [ModeCard; 6] = [
  ModeCard {
    mode: Mode::ConjugationDojo,
    title: "Dojo de Conjugación",
    description: "Entrena tus músculos gramaticales. Regular e Irregular.",
  },
  ModeCard {
    mode: Mode::TriggerDetective,
    title: "Detective de Disparadores",
    description: "¿Indicativo o Subjuntivo? Encuentra la pista.",
  },
  ModeCard {
    mode: Mode::SentenceBuilder,
    title: "Constructor de Frases",
    description: "Crea oraciones complejas con guía paso a paso.",
  },
  ModeCard {
    mode: Mode::SyntaxPuzzle,
    title: "Puzzle de Sintaxis",
    description: "Ordena las palabras para formar frases lógicas.",
  },
  ModeCard {
    mode: Mode::ErrorHunter,
    title: "Cazador de Errores",
    description: "Afina tu oído. Encuentra la frase incorrecta.",
  },
  ModeCard {
    mode: Mode::Roleplay,
    title: "Roleplay Situacional",
    description: "Conversa con la IA en situaciones de la vida real.",
  },
];

pub struct ConceptCard {
  pub title: &'static str,
  pub icon: &'static str,
  /// Inline markup, rendered through `markup::RichText`.
  pub body: &'static str,
}

pub const CONCEPTS: [ConceptCard; 3] = [
  ConceptCard {
    title: "Dos Mundos",
    icon: "🌍 vs 💭",
    body: "El español tiene dos modos principales. El <b>Indicativo</b> es para el mundo real (hechos, certezas). El <b>Subjuntivo</b> es para el mundo subjetivo (deseos, dudas, emociones).",
  },
  ConceptCard {
    title: "W.E.I.R.D.O",
    icon: "👽",
    body: "Usa subjuntivo para: <br/><b>W</b>ishes (Deseos)<br/><b>E</b>motions (Emociones)<br/><b>I</b>mpersonal expressions (Es bueno que...)<br/><b>R</b>ecommendations (Consejos)<br/><b>D</b>oubt (Duda)<br/><b>O</b>jalá",
  },
  ConceptCard {
    title: "El Interruptor",
    icon: "🔌",
    body: "Imagina un interruptor. Si la primera parte de la frase expresa <i>Control/Certeza</i> → Indicativo. Si expresa <i>Influencia/Sentimiento</i> → Subjuntivo.",
  },
];
