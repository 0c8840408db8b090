//! Doctor-facing escalation summary handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use telecare_auth::DoctorUser;
use telecare_common::Result;
use uuid::Uuid;

use super::conversations::SnapshotResponse;
use crate::api::middleware::ConversationsState;
use crate::domain::context::Participant;
use crate::domain::entities::EscalationSummary;
use crate::domain::pickup::DoctorPickup;

/// Escalation summary response DTO
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chat_id: Option<Uuid>,
    pub summary: String,
    pub issue_title: String,
    pub is_doctor_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EscalationSummary> for SummaryResponse {
    fn from(s: EscalationSummary) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            chat_id: s.chat_id,
            summary: s.summary,
            issue_title: s.issue_title,
            is_doctor_active: s.is_doctor_active,
            created_at: s.created_at,
        }
    }
}

/// Escalations no doctor has picked up yet
pub async fn list_open_summaries(
    DoctorUser(ctx): DoctorUser,
    State(state): State<ConversationsState>,
) -> Result<Json<Vec<SummaryResponse>>> {
    let pickup = DoctorPickup::new(state.context(Participant::doctor(ctx.user_id())))?;
    let summaries = pickup.list_open_summaries().await?;

    let responses: Vec<SummaryResponse> = summaries.into_iter().map(Into::into).collect();
    Ok(Json(responses))
}

/// Join the conversation behind a summary, opening one if needed
pub async fn claim_summary(
    DoctorUser(ctx): DoctorUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>> {
    let pickup = DoctorPickup::new(state.context(Participant::doctor(ctx.user_id())))?;
    let session = pickup.claim_summary(id).await?;

    Ok(Json(session.snapshot().into()))
}
