//! Scheduled message CRUD endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use doc_store::MessageFilter;
use policy_core::{limits, CreateMessageRequest, ScheduledMessage, UpdateMessageRequest};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub data: ScheduledMessage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    pub messages: Vec<ScheduledMessage>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    pub success: bool,
    pub data: MessageList,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// POST /api/messages
pub async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let message = request.into_message(Utc::now())?;
    let created = state.store.insert_message(message).await?;
    info!(message_id = %created.id, scheduled_at = %created.scheduled_at, "message scheduled");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            data: created,
        }),
    ))
}

/// GET /api/messages
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let status = query.status.as_deref().map(str::parse).transpose()?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(limits::DEFAULT_PAGE_SIZE)
        .clamp(1, 100);

    let filter = MessageFilter {
        status,
        page,
        limit,
    };
    let result = state.store.list_messages(filter).await?;
    let pages = result.total.div_ceil(limit);

    Ok(Json(MessageListResponse {
        success: true,
        data: MessageList {
            messages: result.messages,
            pagination: Pagination {
                page,
                limit,
                total: result.total,
                pages,
            },
        },
    }))
}

/// GET /api/messages/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state
        .store
        .get_message(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;
    Ok(Json(MessageResponse {
        success: true,
        data: message,
    }))
}

/// PUT /api/messages/:id
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let current = state
        .store
        .get_message(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;
    let updated = request.apply(&current, Utc::now())?;
    let saved = state.store.update_message(updated).await?;
    Ok(Json(MessageResponse {
        success: true,
        data: saved,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /api/messages/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.store.delete_message(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Message not found"));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "Message deleted".into(),
    }))
}
