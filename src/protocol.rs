//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! The server is authoritative: after every action it pushes a full `view` of
//! the open mode. Answers (correct forms, option correctness, explanations,
//! the original puzzle sentence) stay out of the view until the round is
//! answered.

use serde::{Deserialize, Serialize};

use crate::content::Speaker;
use crate::domain::Mode;
use crate::markup::RichText;
use crate::practice::Practice;
use crate::puzzle::{BoardStatus, Side, WordToken};
use crate::scoring::ScoreSummary;
use crate::seeds::{ConceptCard, ModeCard, CONCEPTS, MODE_CATALOG};
use crate::session::{BuilderStep, Phase, Round, TriggerStage};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Navigate {
        mode: Mode,
    },
    /// Load (or reload after a failure) a round in the open mode.
    NewChallenge,
    ToggleHint,
    SubmitConjugation {
        answer: String,
    },
    ConceptNext,
    ConceptPrev,
    StartPractice,
    BackToLearn,
    SelectTriggerOption {
        index: usize,
    },
    ChooseVerb {
        verb: String,
    },
    SubmitSentence {
        text: String,
    },
    MoveToken {
        id: usize,
        from: Side,
    },
    ResetTokens,
    SubmitPuzzle,
    SelectErrorOption {
        id: i64,
    },
    RoleplaySend {
        text: String,
    },
    Score,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    View {
        view: ViewOut,
        score: ScoreSummary,
    },
    /// Non-fatal feedback such as a rejected verb or an action that is not
    /// possible right now.
    Notice {
        message: String,
    },
    Error {
        message: String,
    },
}

// --- Views ---

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewOut {
    Home {
        modes: Vec<ModeOut>,
    },
    ConjugationDojo {
        #[serde(flatten)]
        round: RoundOut,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<ConjugationOut>,
    },
    TriggerDetective {
        stage: TriggerStage,
        card: usize,
        total_cards: usize,
        concept: ConceptOut,
        #[serde(flatten)]
        round: RoundOut,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<TriggerOut>,
    },
    SentenceBuilder {
        #[serde(flatten)]
        round: RoundOut,
        step: BuilderStep,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<SentenceOut>,
    },
    SyntaxPuzzle {
        #[serde(flatten)]
        round: RoundOut,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<PuzzleOut>,
    },
    ErrorHunter {
        #[serde(flatten)]
        round: RoundOut,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<ErrorHuntOut>,
    },
    #[serde(rename = "ROLEPLAY_SCENARIO")]
    Roleplay {
        #[serde(flatten)]
        round: RoundOut,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<RoleplayOut>,
    },
}

#[derive(Debug, Serialize)]
pub struct RoundOut {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<C> From<&Round<C>> for RoundOut {
    fn from(r: &Round<C>) -> Self {
        Self { phase: r.phase(), error: r.error().map(str::to_string) }
    }
}

fn is_answered(phase: Phase) -> bool {
    matches!(phase, Phase::AnsweredCorrect | Phase::AnsweredIncorrect)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConjugationOut {
    pub verb: String,
    pub mood: String,
    pub person: String,
    pub tense: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_form: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOut {
    pub sentence_start: String,
    pub trigger_type: String,
    pub options: Vec<TriggerOptionOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOptionOut {
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<RichText>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceOut {
    pub context: String,
    pub trigger: String,
    pub verb_options: Vec<String>,
    pub target_translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_verb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOut {
    pub is_correct: bool,
    pub feedback: RichText,
    pub correction: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleOut {
    pub translation: String,
    pub status: BoardStatus,
    pub available: Vec<TokenOut>,
    pub selected: Vec<TokenOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sentence: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenOut {
    pub id: usize,
    pub text: String,
}

impl From<&WordToken> for TokenOut {
    fn from(t: &WordToken) -> Self {
        Self { id: t.id, text: t.text.clone() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHuntOut {
    pub context: String,
    pub options: Vec<ErrorOptionOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<RichText>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOptionOut {
    pub id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleplayOut {
    pub scenario: String,
    pub transcript: Vec<TurnOut>,
    pub waiting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TurnOut {
    pub speaker: Speaker,
    pub text: RichText,
}

/// Snapshot of whatever the learner is looking at.
pub fn view_of(p: &Practice) -> ViewOut {
    match p.mode() {
        Mode::Home => ViewOut::Home { modes: MODE_CATALOG.iter().map(ModeOut::from).collect() },

        Mode::ConjugationDojo => {
            let s = p.conjugation();
            let answered = is_answered(s.round().phase());
            ViewOut::ConjugationDojo {
                round: s.round().into(),
                challenge: s.round().challenge().map(|c| ConjugationOut {
                    verb: c.verb.clone(),
                    mood: c.mood.clone(),
                    person: c.person.clone(),
                    tense: c.tense.clone(),
                    hint: s.hint_shown().then(|| RichText::parse(&c.hint)),
                    answer: s.answer().map(str::to_string),
                    correct_form: answered.then(|| c.correct_form.clone()),
                }),
            }
        }

        Mode::TriggerDetective => {
            let s = p.trigger();
            let answered = is_answered(s.round().phase());
            let card = s.card().min(CONCEPTS.len() - 1);
            ViewOut::TriggerDetective {
                stage: s.stage(),
                card,
                total_cards: CONCEPTS.len(),
                concept: ConceptOut::from(&CONCEPTS[card]),
                round: s.round().into(),
                challenge: s.round().challenge().map(|c| TriggerOut {
                    sentence_start: c.sentence_start.clone(),
                    trigger_type: c.trigger_type.clone(),
                    options: c
                        .options
                        .iter()
                        .enumerate()
                        .map(|(index, o)| TriggerOptionOut {
                            index,
                            text: o.text.clone(),
                            is_correct: answered.then_some(o.is_correct),
                            explanation: answered.then(|| RichText::parse(&o.explanation)),
                        })
                        .collect(),
                    picked: s.picked(),
                }),
            }
        }

        Mode::SentenceBuilder => {
            let s = p.builder();
            ViewOut::SentenceBuilder {
                round: s.round().into(),
                step: s.step(),
                challenge: s.round().challenge().map(|c| SentenceOut {
                    context: c.context.clone(),
                    trigger: c.trigger.clone(),
                    verb_options: c.verb_options.clone(),
                    target_translation: c.target_translation.clone(),
                    chosen_verb: s.chosen_verb().map(str::to_string),
                    attempt: s.attempt().map(str::to_string),
                    evaluation: s.evaluation().map(|e| EvaluationOut {
                        is_correct: e.is_correct,
                        feedback: RichText::parse(&e.feedback),
                        correction: e.correction.clone(),
                    }),
                }),
            }
        }

        Mode::SyntaxPuzzle => {
            let s = p.puzzle();
            let solved = s.round().phase() == Phase::AnsweredCorrect;
            ViewOut::SyntaxPuzzle {
                round: s.round().into(),
                challenge: s.round().challenge().map(|c| PuzzleOut {
                    translation: c.translation.clone(),
                    status: s.board().status(),
                    available: s.board().available().iter().map(TokenOut::from).collect(),
                    selected: s.board().selected().iter().map(TokenOut::from).collect(),
                    original_sentence: solved.then(|| c.original_sentence.clone()),
                }),
            }
        }

        Mode::ErrorHunter => {
            let s = p.error_hunt();
            let answered = is_answered(s.round().phase());
            ViewOut::ErrorHunter {
                round: s.round().into(),
                challenge: s.round().challenge().map(|c| ErrorHuntOut {
                    context: c.context.clone(),
                    options: c
                        .options
                        .iter()
                        .map(|o| ErrorOptionOut {
                            id: o.id,
                            text: o.text.clone(),
                            is_correct: answered.then_some(o.is_correct),
                        })
                        .collect(),
                    picked: s.picked(),
                    explanation: answered.then(|| RichText::parse(&c.explanation)),
                }),
            }
        }

        Mode::Roleplay => {
            let s = p.roleplay();
            ViewOut::Roleplay {
                round: s.round().into(),
                challenge: s.round().challenge().map(|c| RoleplayOut {
                    scenario: c.scenario.clone(),
                    transcript: s
                        .transcript()
                        .iter()
                        .map(|t| TurnOut { speaker: t.speaker, text: RichText::parse(&t.text) })
                        .collect(),
                    waiting: s.is_waiting(),
                    last_error: s.last_error().map(str::to_string),
                }),
            }
        }
    }
}

// --- HTTP DTOs ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub model_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ModeOut {
    pub mode: Mode,
    pub title: &'static str,
    pub description: &'static str,
    pub reward: u32,
}

impl From<&ModeCard> for ModeOut {
    fn from(c: &ModeCard) -> Self {
        Self { mode: c.mode, title: c.title, description: c.description, reward: c.mode.reward() }
    }
}

#[derive(Debug, Serialize)]
pub struct ConceptOut {
    pub title: &'static str,
    pub icon: &'static str,
    pub body: RichText,
}

impl From<&ConceptCard> for ConceptOut {
    fn from(c: &ConceptCard) -> Self {
        Self { title: c.title, icon: c.icon, body: RichText::parse(c.body) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use crate::domain::{Challenge, ConjugationChallenge, ErrorChallenge, ErrorOption, RoleplayOpening};
    use crate::scoring::{MemoryStore, ScoreBoard};
    use serde_json::{json, Value};

    fn conjugation() -> Challenge {
        Challenge::Conjugation(ConjugationChallenge {
            verb: "ir".into(),
            mood: "Subjuntivo".into(),
            person: "nosotros".into(),
            tense: "Presente".into(),
            correct_form: "vayamos".into(),
            hint: "<b>Irregular</b>".into(),
        })
    }

    fn loaded(mode: Mode, challenge: Challenge) -> Practice {
        let mut p = Practice::default();
        p.navigate(mode);
        let job = p.begin_load().unwrap();
        assert!(p.finish_load(job.mode, job.ticket, Ok(challenge)));
        p
    }

    fn json_of(p: &Practice) -> Value {
        serde_json::to_value(view_of(p)).unwrap()
    }

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"navigate","mode":"ROLEPLAY_SCENARIO"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Navigate { mode: Mode::Roleplay }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"move_token","id":3,"from":"selected"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::MoveToken { id: 3, from: Side::Selected }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"new_challenge"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::NewChallenge));
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"navigate","mode":"NOPE"}"#).is_err());
    }

    #[test]
    fn conjugation_answer_is_hidden_until_answered() {
        let mut p = loaded(Mode::ConjugationDojo, conjugation());
        let v = json_of(&p);
        assert_eq!(v["mode"], "CONJUGATION_DOJO");
        assert_eq!(v["phase"], "active");
        assert!(v["challenge"].get("correctForm").is_none());
        assert!(v["challenge"].get("hint").is_none());
        assert!(!v.to_string().contains("vayamos"));

        let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
        p.toggle_hint().unwrap();
        p.submit_conjugation("vamos", &mut score).unwrap();
        let v = json_of(&p);
        assert_eq!(v["phase"], "answered_incorrect");
        assert_eq!(v["challenge"]["correctForm"], "vayamos");
        assert_eq!(v["challenge"]["hint"], json!([{"kind": "text", "text": "Irregular", "bold": true}]));
    }

    #[test]
    fn error_options_reveal_correctness_after_pick() {
        let challenge = Challenge::Error(ErrorChallenge {
            context: "Un deseo".into(),
            options: vec![
                ErrorOption { id: 7, text: "Ojalá que llueva.".into(), is_correct: true },
                ErrorOption { id: 9, text: "Ojalá que llueve.".into(), is_correct: false },
            ],
            explanation: "Ojalá → <i>subjuntivo</i>".into(),
        });
        let mut p = loaded(Mode::ErrorHunter, challenge);
        let before = json_of(&p);
        assert!(before["challenge"]["options"][0].get("isCorrect").is_none());
        assert!(before["challenge"].get("explanation").is_none());

        let mut score = ScoreBoard::open(Box::new(MemoryStore::default()));
        p.select_error_option(9, &mut score).unwrap();
        let after = json_of(&p);
        assert_eq!(after["challenge"]["options"][0]["isCorrect"], true);
        assert_eq!(after["challenge"]["picked"], 9);
        assert!(after["challenge"]["explanation"].is_array());
    }

    #[test]
    fn failed_round_carries_its_message() {
        let mut p = Practice::default();
        p.navigate(Mode::SyntaxPuzzle);
        let job = p.begin_load().unwrap();
        p.finish_load(job.mode, job.ticket, Err(ContentError::Malformed("scrambledWords empty".into())));
        let v = json_of(&p);
        assert_eq!(v["phase"], "failed");
        assert!(v["error"].as_str().unwrap().contains("scrambledWords"));
        assert!(v.get("challenge").is_none());
    }

    #[test]
    fn home_lists_every_mode_and_trigger_starts_on_cards() {
        let mut p = Practice::default();
        let v = json_of(&p);
        assert_eq!(v["modes"].as_array().unwrap().len(), 6);
        assert_eq!(v["modes"][5]["mode"], "ROLEPLAY_SCENARIO");

        p.navigate(Mode::TriggerDetective);
        let v = json_of(&p);
        assert_eq!(v["stage"], "learn");
        assert_eq!(v["concept"]["title"], "Dos Mundos");
        assert_eq!(v["phase"], "empty");
    }

    #[test]
    fn server_messages_are_tagged() {
        let msg = ServerWsMessage::Notice { message: "Ese verbo no encaja.".into() };
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({"type": "notice", "message": "Ese verbo no encaja."}));
        let msg = ServerWsMessage::View { view: view_of(&Practice::default()), score: ScoreSummary::for_points(40) };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "view");
        assert_eq!(v["score"]["title"], "Novato");
        assert_eq!(v["view"]["mode"], "HOME");
    }

    #[test]
    fn roleplay_transcript_keeps_speakers() {
        let opening = RoleplayOpening {
            scenario: "Planear un viaje".into(),
            teacher_prompt: "¿Adónde quieres que vayamos?".into(),
        };
        let p = loaded(Mode::Roleplay, Challenge::Roleplay(opening));
        let v = json_of(&p);
        assert_eq!(v["mode"], "ROLEPLAY_SCENARIO");
        assert_eq!(v["challenge"]["transcript"][0]["speaker"], "tutor");
        assert_eq!(v["challenge"]["waiting"], false);
    }
}
