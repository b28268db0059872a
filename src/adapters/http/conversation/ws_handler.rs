//! WebSocket handler for real-time conversations.
//!
//! # Connection Flow
//! 1. Client connects to `/ws` (new conversation) or `/ws/:session_id`
//! 2. An unknown or malformed session id starts a new conversation instead
//! 3. Server sends `connected` with the session id and greeting
//! 4. Each client `message` produces a `response`, followed by `completed`
//!    when that turn finished the conversation
//! 5. A failed turn produces `error`; the connection stays open
//! 6. Without a loaded agent the socket is closed with code 1008

use std::borrow::Cow;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::adapters::http::state::IntakeAppState;
use crate::application::handlers::intake::{ProcessTurnCommand, StartConversationCommand};
use crate::domain::conversation::{ConversationRecord, ConversationStatus, MessageRole};
use crate::domain::foundation::SessionId;
use crate::domain::turn::AgentContext;

use super::ws_messages::{ClientMessage, ServerMessage};

/// Policy violation; the server cannot hold a conversation.
const CLOSE_POLICY: u16 = 1008;

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket Upgrade Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// Route: `GET /ws` - always starts a new conversation.
pub async fn new_conversation_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<IntakeAppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_conversation_socket(socket, None, state))
}

/// Route: `GET /ws/:session_id` - continues a stored conversation.
pub async fn conversation_ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<IntakeAppState>,
) -> Response {
    let session_id = session_id.parse::<SessionId>().ok();
    ws.on_upgrade(move |socket| handle_conversation_socket(socket, session_id, state))
}

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket Connection Handler
// ════════════════════════════════════════════════════════════════════════════════

async fn handle_conversation_socket(
    socket: WebSocket,
    requested: Option<SessionId>,
    state: IntakeAppState,
) {
    let (mut sender, mut receiver) = socket.split();

    let Some(context) = state.agent().await else {
        let close = Message::Close(Some(CloseFrame {
            code: CLOSE_POLICY,
            reason: Cow::from("Agent not configured"),
        }));
        let _ = sender.send(close).await;
        return;
    };

    let (session_id, connected) = match open_conversation(&state, &context, requested).await {
        Ok(opened) => opened,
        Err(message) => {
            tracing::error!(error = %message, "Failed to open conversation");
            let _ = send_server_message(&mut sender, &ServerMessage::Error { message }).await;
            return;
        }
    };

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    if send_server_message(&mut sender, &connected).await.is_err() {
        return;
    }

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Message { content }) => {
                    let replies = handle_user_message(&state, &context, session_id, content).await;
                    let mut failed = false;
                    for reply in &replies {
                        if send_server_message(&mut sender, reply).await.is_err() {
                            failed = true;
                            break;
                        }
                    }
                    if failed {
                        break;
                    }
                }
                Ok(ClientMessage::Ping) => {
                    if send_server_message(&mut sender, &ServerMessage::Pong).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to parse client message: {}", e);
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(session_id = %session_id, "Client closed connection");
                break;
            }
            Ok(Message::Ping(data)) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id = %session_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    tracing::info!(session_id = %session_id, "WebSocket connection closed");
}

// ════════════════════════════════════════════════════════════════════════════════
// Message Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Resumes the requested conversation when it exists, otherwise starts one.
async fn open_conversation(
    state: &IntakeAppState,
    context: &AgentContext,
    requested: Option<SessionId>,
) -> Result<(SessionId, ServerMessage), String> {
    if let Some(id) = requested {
        match state.store.get(&id).await {
            Ok(Some(record)) => {
                let greeting = greeting_of(&record)
                    .unwrap_or_else(|| context.definition().greeting.clone());
                return Ok((
                    id,
                    ServerMessage::Connected {
                        session_id: id.to_string(),
                        greeting,
                        status: record.status,
                    },
                ));
            }
            Ok(None) => {
                tracing::debug!(session_id = %id, "Unknown session, starting a new conversation");
            }
            Err(e) => return Err(e.to_string()),
        }
    }

    let started = state
        .start_handler(context.clone())
        .handle(StartConversationCommand::default())
        .await
        .map_err(|e| e.to_string())?;

    Ok((
        started.session_id,
        ServerMessage::Connected {
            session_id: started.session_id.to_string(),
            greeting: started.greeting,
            status: started.status,
        },
    ))
}

fn greeting_of(record: &ConversationRecord) -> Option<String> {
    record
        .messages
        .first()
        .filter(|m| m.role == MessageRole::Agent)
        .map(|m| m.content.clone())
}

/// Runs one turn and returns the frames to send, in order.
async fn handle_user_message(
    state: &IntakeAppState,
    context: &AgentContext,
    session_id: SessionId,
    content: String,
) -> Vec<ServerMessage> {
    tracing::debug!(session_id = %session_id, "Processing user message");

    let result = state
        .turn_handler(context.clone())
        .handle(ProcessTurnCommand {
            session_id,
            utterance: content,
        })
        .await;

    match result {
        Ok(result) => {
            let completed = result.status == ConversationStatus::Completed;
            let mut replies = vec![ServerMessage::Response {
                content: result.reply,
                status: result.status,
                collected_data: result.collected_data.clone(),
            }];
            if completed {
                replies.push(ServerMessage::Completed {
                    collected_data: result.collected_data,
                });
            }
            replies
        }
        Err(e) => vec![ServerMessage::Error {
            message: e.to_string(),
        }],
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Helper Functions
// ════════════════════════════════════════════════════════════════════════════════

async fn send_server_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), S::Error>
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::warn!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}
