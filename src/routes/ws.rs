//! WebSocket upgrade + message loop.
//!
//! Each connection owns one `Practice`. Messages are applied in arrival order
//! on the read loop; anything that has to wait for the model is started there
//! (so guards and tickets see the right order) and then finished in a spawned
//! task. All outbound messages go through one writer task, so a reply for a
//! socket that has since closed is silently dropped.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::practice::{complete_evaluation, complete_load, complete_roleplay_turn, LoadJob, Practice};
use crate::protocol::{view_of, ClientWsMessage, ServerWsMessage};
use crate::session::builder::EvaluationRequest;
use crate::session::roleplay::TurnRequest;
use crate::session::{SessionError, VerbChoice};
use crate::state::AppState;

type Outbox = mpsc::UnboundedSender<Message>;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "subjuntivo_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
  info!(target: "subjuntivo_backend", "WebSocket connected");
  let (mut sink, mut stream) = socket.split();
  let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

  let writer = tokio::spawn(async move {
    while let Some(msg) = rx.recv().await {
      if let Err(e) = sink.send(msg).await {
        error!(target: "subjuntivo_backend", error = %e, "WS send error");
        break;
      }
    }
  });

  let practice = Arc::new(Mutex::new(Practice::default()));
  push_view(&tx, &state, &practice).await;

  while let Some(Ok(msg)) = stream.next().await {
    match msg {
      Message::Text(txt) => match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => {
          debug!(target: "subjuntivo_backend", "WS received: {:?}", &incoming);
          if let Some(job) = apply(incoming, &state, &practice, &tx).await {
            spawn_followup(job, state.clone(), practice.clone(), tx.clone());
          }
        }
        Err(e) => send(&tx, &ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
      },
      Message::Ping(payload) => {
        let _ = tx.send(Message::Pong(payload));
      }
      Message::Close(_) => break,
      _ => {}
    }
  }

  // In-flight tasks still hold senders; their late results are stale.
  practice.lock().await.close();
  writer.abort();
  info!(target: "subjuntivo_backend", "WebSocket disconnected");
}

/// Work that must wait for the content source.
enum Followup {
  Load(LoadJob),
  Evaluate(EvaluationRequest),
  Turn(TurnRequest),
}

/// Apply one client message under the practice lock and reply with a fresh view.
#[instrument(level = "info", skip(state, practice, tx))]
async fn apply(
  msg: ClientWsMessage,
  state: &AppState,
  practice: &Mutex<Practice>,
  tx: &Outbox,
) -> Option<Followup> {
  let mut p = practice.lock().await;

  let outcome: Result<Option<Followup>, SessionError> = match msg {
    ClientWsMessage::Ping => {
      send(tx, &ServerWsMessage::Pong);
      return None;
    }
    ClientWsMessage::Score => Ok(None),

    ClientWsMessage::Navigate { mode } => {
      if p.navigate(mode) {
        p.begin_load().map(|job| Some(Followup::Load(job)))
      } else {
        Ok(None)
      }
    }
    ClientWsMessage::NewChallenge => p.begin_load().map(|job| Some(Followup::Load(job))),

    ClientWsMessage::ToggleHint => p.toggle_hint().map(|_| None),
    ClientWsMessage::SubmitConjugation { answer } => {
      let mut score = state.score.lock().await;
      p.submit_conjugation(&answer, &mut score).map(|_| None)
    }

    ClientWsMessage::ConceptNext => p.concept_next().map(|_| None),
    ClientWsMessage::ConceptPrev => p.concept_prev().map(|_| None),
    ClientWsMessage::StartPractice => p
      .start_practice()
      .and_then(|()| p.begin_load())
      .map(|job| Some(Followup::Load(job))),
    ClientWsMessage::BackToLearn => p.back_to_learn().map(|()| None),
    ClientWsMessage::SelectTriggerOption { index } => {
      let mut score = state.score.lock().await;
      p.select_trigger_option(index, &mut score).map(|_| None)
    }

    ClientWsMessage::ChooseVerb { verb } => p.choose_verb(&verb).map(|choice| {
      if choice == VerbChoice::Rejected {
        send(tx, &ServerWsMessage::Notice { message: format!("«{}» no encaja en este contexto. Prueba otro verbo.", verb) });
      }
      None
    }),
    ClientWsMessage::SubmitSentence { text } => p.begin_evaluate(&text).map(|req| Some(Followup::Evaluate(req))),

    ClientWsMessage::MoveToken { id, from } => p.move_token(id, from).map(|()| None),
    ClientWsMessage::ResetTokens => p.reset_tokens().map(|()| None),
    ClientWsMessage::SubmitPuzzle => {
      let mut score = state.score.lock().await;
      p.submit_puzzle(&mut score).map(|_| None)
    }

    ClientWsMessage::SelectErrorOption { id } => {
      let mut score = state.score.lock().await;
      p.select_error_option(id, &mut score).map(|_| None)
    }

    ClientWsMessage::RoleplaySend { text } => p.begin_roleplay_turn(&text).map(|req| Some(Followup::Turn(req))),
  };

  let followup = match outcome {
    Ok(f) => f,
    Err(e) => {
      warn!(target: "session", mode = p.mode().as_str(), error = %e, "Action rejected");
      send(tx, &ServerWsMessage::Notice { message: e.to_string() });
      None
    }
  };

  let view = view_of(&p);
  drop(p);
  let score = state.score.lock().await.summary();
  send(tx, &ServerWsMessage::View { view, score });
  followup
}

fn spawn_followup(job: Followup, state: Arc<AppState>, practice: Arc<Mutex<Practice>>, tx: Outbox) {
  tokio::spawn(
    async move {
      let applied = match job {
        Followup::Load(job) => complete_load(&*practice, &state.content, job).await,
        Followup::Evaluate(req) => complete_evaluation(&*practice, &state.content, &state.score, req).await,
        Followup::Turn(req) => complete_roleplay_turn(&*practice, &state.content, req).await,
      };
      if applied {
        push_view(&tx, &state, &practice).await;
      } else {
        debug!(target: "session", "Late result dropped; no view pushed");
      }
    }
    .in_current_span(),
  );
}

async fn push_view(tx: &Outbox, state: &AppState, practice: &Mutex<Practice>) {
  let view = view_of(&*practice.lock().await);
  let score = state.score.lock().await.summary();
  send(tx, &ServerWsMessage::View { view, score });
}

fn send(tx: &Outbox, msg: &ServerWsMessage) {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  // A closed channel means the socket is gone.
  let _ = tx.send(Message::Text(out));
}
