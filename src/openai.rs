//! Minimal OpenAI-compatible client acting as the content source.
//!
//! We only call chat.completions and request either plain text or a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//! Any endpoint speaking the same protocol works (OPENAI_BASE_URL).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.
//! There are no retries and, unless OPENAI_TIMEOUT_SECS is set, no timeout: a
//! failed call is reported once and the learner reloads.

use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::content::{ContentError, ContentSource, Speaker, Turn};
use crate::domain::{
  ConjugationChallenge, ErrorChallenge, PuzzleChallenge, RoleplayOpening, SentenceChallenge,
  SentenceEvaluation, TriggerChallenge, Validate,
};
use crate::util::{fill_template, strip_code_fences, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());
    let timeout = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .filter(|secs| *secs > 0);

    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder
      .build()
      .map_err(|e| error!(target: "subjuntivo_backend", error = %e, "Failed to build HTTP client"))
      .ok()?;

    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), fast_model, strong_model, prompts })
  }

  /// One chat completion. `json` switches on the `json_object` response format.
  #[instrument(level = "info", skip(self, messages), fields(model = %model, turns = messages.len()))]
  async fn chat(
    &self,
    model: &str,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    json: bool,
  ) -> Result<String, ContentError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages,
      temperature,
      response_format: json.then(|| ResponseFormat { r#type: "json_object".into() }),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "subjuntivo-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| ContentError::Unavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(?status, elapsed = ?start.elapsed(), "Model call failed");
      return Err(ContentError::Unavailable(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| ContentError::Malformed(format!("unexpected response body: {e}")))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");
    Ok(text)
  }

  /// Structured call: system instruction + one user prompt, parsed and validated as `T`.
  async fn structured<T: DeserializeOwned + Validate>(
    &self,
    kind: &'static str,
    user: String,
    temperature: f32,
  ) -> Result<T, ContentError> {
    let messages = vec![
      ChatMessageReq::system(&self.prompts.system_instruction),
      ChatMessageReq::user(user),
    ];
    let raw = self.chat(&self.strong_model, messages, temperature, true).await?;
    let parsed = parse_payload::<T>(&raw);
    match &parsed {
      Ok(_) => debug!(%kind, "Payload accepted"),
      Err(e) => error!(%kind, error = %e, preview = %trunc_for_log(&raw, 120), "Payload rejected"),
    }
    parsed
  }
}

/// Strip fences, parse, validate. Both failures are `Malformed`.
pub fn parse_payload<T: DeserializeOwned + Validate>(raw: &str) -> Result<T, ContentError> {
  let cleaned = strip_code_fences(raw);
  if cleaned.is_empty() {
    return Err(ContentError::Malformed("empty response".into()));
  }
  let value: T = serde_json::from_str(&cleaned)
    .map_err(|e| ContentError::Malformed(format!("JSON parse error: {e}")))?;
  value.validate().map_err(ContentError::Malformed)?;
  Ok(value)
}

impl ContentSource for OpenAI {
  #[instrument(level = "info", skip(self))]
  async fn conjugation_challenge(&self) -> Result<ConjugationChallenge, ContentError> {
    let seed: u32 = rand::thread_rng().gen();
    let user = fill_template(&self.prompts.conjugation_user, &[("seed", &seed.to_string())]);
    self.structured("conjugation", user, 0.95).await
  }

  #[instrument(level = "info", skip(self))]
  async fn trigger_challenge(&self) -> Result<TriggerChallenge, ContentError> {
    self.structured("trigger", self.prompts.trigger_user.clone(), 0.9).await
  }

  #[instrument(level = "info", skip(self))]
  async fn sentence_scenario(&self) -> Result<SentenceChallenge, ContentError> {
    self.structured("sentence", self.prompts.sentence_user.clone(), 0.9).await
  }

  #[instrument(level = "info", skip(self, context, trigger, text), fields(text_len = text.len()))]
  async fn evaluate_sentence(&self, context: &str, trigger: &str, text: &str) -> Result<SentenceEvaluation, ContentError> {
    let user = fill_template(
      &self.prompts.sentence_eval_user,
      &[("context", context), ("trigger", trigger), ("answer", text)],
    );
    self.structured("sentence_eval", user, 0.2).await
  }

  #[instrument(level = "info", skip(self))]
  async fn puzzle_challenge(&self) -> Result<PuzzleChallenge, ContentError> {
    self.structured("puzzle", self.prompts.puzzle_user.clone(), 0.9).await
  }

  #[instrument(level = "info", skip(self))]
  async fn error_challenge(&self) -> Result<ErrorChallenge, ContentError> {
    self.structured("error_hunt", self.prompts.error_user.clone(), 0.9).await
  }

  #[instrument(level = "info", skip(self))]
  async fn roleplay_start(&self) -> Result<RoleplayOpening, ContentError> {
    self.structured("roleplay", self.prompts.roleplay_user.clone(), 0.95).await
  }

  #[instrument(level = "info", skip(self, history, text), fields(history = history.len(), text_len = text.len()))]
  async fn roleplay_turn(&self, history: &[Turn], text: &str) -> Result<String, ContentError> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessageReq::system(&self.prompts.system_instruction));
    messages.extend(history.iter().map(ChatMessageReq::from));
    messages.push(ChatMessageReq::user(text));
    let reply = self.chat(&self.fast_model, messages, 0.7, false).await?;
    Ok(strip_code_fences(&reply))
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize, Debug, PartialEq)]
struct ChatMessageReq { role: String, content: String }

impl ChatMessageReq {
  fn system(content: impl Into<String>) -> Self {
    Self { role: "system".into(), content: content.into() }
  }
  fn user(content: impl Into<String>) -> Self {
    Self { role: "user".into(), content: content.into() }
  }
}

impl From<&Turn> for ChatMessageReq {
  fn from(turn: &Turn) -> Self {
    let role = match turn.speaker {
      Speaker::Learner => "user",
      Speaker::Tutor => "assistant",
    };
    Self { role: role.into(), content: turn.text.clone() }
  }
}

#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fenced_payload_parses_and_validates() {
    let raw = "```json\n{\"originalSentence\":\"Ojalá que vengas.\",\"scrambledWords\":[\"vengas.\",\"Ojalá\",\"que\"],\"translation\":\"I hope you come.\"}\n```";
    let p: PuzzleChallenge = parse_payload(raw).unwrap();
    assert_eq!(p.scrambled_words.len(), 3);
  }

  #[test]
  fn shape_errors_are_malformed() {
    let err = parse_payload::<ErrorChallenge>(r#"{"context":"x","options":[],"explanation":""}"#).unwrap_err();
    assert!(matches!(err, ContentError::Malformed(_)));
    let err = parse_payload::<ConjugationChallenge>("no es json").unwrap_err();
    assert!(matches!(err, ContentError::Malformed(_)));
    let err = parse_payload::<RoleplayOpening>("```\n```").unwrap_err();
    assert_eq!(err, ContentError::Malformed("empty response".into()));
  }

  #[test]
  fn roleplay_history_maps_to_chat_roles() {
    let turns = [Turn::learner("Hola"), Turn::tutor("¡Hola! ¿Qué quieres que hagamos?")];
    let msgs: Vec<ChatMessageReq> = turns.iter().map(ChatMessageReq::from).collect();
    assert_eq!(msgs[0].role, "user");
    assert_eq!(msgs[1].role, "assistant");
  }

  #[test]
  fn openai_error_body_is_unwrapped() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_openai_error("<html>"), None);
  }
}
