use crate::error::{ApiError, ApiResult};
use crate::helpers::session::resolve_session_id;
use crate::models::{stream_event, visible_messages};
use crate::state::AppState;
use actix_web::web::Bytes;
use actix_web::{delete, get, post, web, HttpResponse};
use futures_util::{stream, StreamExt};
use shared_types::{
    ChatData, ChatRequest, ChatResponse, ClearHistoryResponse, HistoryData, HistoryResponse,
    StreamEvent,
};
use tokio::sync::mpsc;
use tracing::{error, info};

#[post("/chat")]
pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let message = request
        .non_empty_message()
        .ok_or_else(ApiError::message_required)?
        .to_string();
    let agent = state.agent()?;
    let session_id = resolve_session_id(request.session_id.as_deref());

    info!(session_id = %session_id, message = %message, "Chat message received");

    let _turn = state.locks.acquire(&session_id).await;
    let mut history = state.sessions.get_or_create(&session_id).await?;
    let reply = agent.respond(&mut history, &message).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Chat turn failed");
        e
    })?;

    let conversation_length = history.len();
    state.sessions.set(&session_id, history).await?;

    info!(session_id = %session_id, conversation_length, "Chat turn completed");

    Ok(HttpResponse::Ok().json(ChatResponse::new(ChatData {
        message: Some(reply),
        session_id,
        conversation_length,
    })))
}

#[post("/chat/stream")]
pub async fn chat_stream(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let message = request
        .non_empty_message()
        .ok_or_else(ApiError::message_required)?
        .to_string();
    let session_id = resolve_session_id(request.session_id.as_deref());

    info!(session_id = %session_id, message = %message, "Streaming chat message received");

    let (tx, rx) = mpsc::unbounded_channel::<StreamEvent>();
    let state = state.into_inner();

    actix_web::rt::spawn(async move {
        let _turn = state.locks.acquire(&session_id).await;

        let result = async {
            // Reported in-band: headers are committed before the turn runs
            let agent = state.agent()?;
            let mut history = state.sessions.get_or_create(&session_id).await?;
            let sink_tx = tx.clone();
            agent
                .respond_streaming(&mut history, &message, move |event| {
                    if let Some(event) = stream_event(event) {
                        // Receiver gone means the client disconnected
                        let _ = sink_tx.send(event);
                    }
                })
                .await?;
            state.sessions.set(&session_id, history).await?;
            Ok::<(), ApiError>(())
        }
        .await;

        let last = match result {
            Ok(()) => {
                info!(session_id = %session_id, "Streamed turn completed");
                StreamEvent::Done
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Streamed turn failed");
                StreamEvent::Error {
                    error: e.to_string(),
                }
            }
        };
        let _ = tx.send(last);
    });

    // Ends after the terminal frame even if a sender is still alive
    let frames = stream::unfold(Some(rx), |rx| async move {
        let mut rx = rx?;
        let event = rx.recv().await?;
        let next = (!event.is_terminal()).then_some(rx);
        Some((event, next))
    })
    .map(|event| event.to_sse_frame().map(Bytes::from));

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(frames))
}

#[get("/history/{session_id}")]
pub async fn get_history(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let session_id = session_id.into_inner();
    let history = state
        .sessions
        .get(&session_id)
        .await?
        .ok_or_else(ApiError::session_not_found)?;

    let messages = visible_messages(&history);
    Ok(HttpResponse::Ok().json(HistoryResponse::new(HistoryData {
        session_id,
        message_count: messages.len(),
        messages,
    })))
}

#[delete("/history/{session_id}")]
pub async fn clear_history(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let session_id = session_id.into_inner();
    let _turn = state.locks.acquire(&session_id).await;
    let removed = state.sessions.delete(&session_id).await?;
    info!(session_id = %session_id, removed, "Conversation history cleared");
    Ok(HttpResponse::Ok().json(ClearHistoryResponse::default()))
}
