//! Escalation API handler

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use telecare_auth::PatientUser;
use telecare_common::Result;
use uuid::Uuid;

use super::summaries::SummaryResponse;
use crate::api::middleware::ConversationsState;
use crate::domain::context::Participant;
use crate::domain::escalation::EscalationWorkflow;

/// Ask for a human doctor; the conversation stops receiving automated replies
pub async fn request_human_doctor(
    PatientUser(ctx): PatientUser,
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SummaryResponse>)> {
    let workflow = EscalationWorkflow::new(state.context(Participant::patient(ctx.user_id())));
    let summary = workflow.request_human_doctor(id).await?;

    Ok((StatusCode::CREATED, Json(summary.into())))
}
