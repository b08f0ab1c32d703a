//! HTTP API endpoint handlers.
//!
//! Handlers only translate between DTOs and domain values; every state change
//! goes through a use case.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{
        DisplayName, SessionId, SessionName, TicketEdit, TicketId, TicketTitle, UserId, VoteValue,
    },
    infrastructure::dto::http::{
        CreateSessionRequest, CreateTicketRequest, CreateUserRequest, CurrentTicketDto,
        MembershipDto, RedirectDto, SessionView, TicketDto, TransferOwnerRequest,
        UpdateTicketRequest, UserDto, VoteDto, VoteRequest, VotingResultDto,
    },
    ui::{error::ApiError, extract::Caller, state::AppState},
};

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Register a user; the returned id is the caller identity for later requests.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let display_name = DisplayName::new(body.display_name)?;
    let user = state.register_user.execute(display_name).await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(&user))))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(body): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let name = SessionName::new(body.name)?;
    let session = state.create_session.execute(&caller, name).await?;
    Ok((StatusCode::CREATED, Json(SessionView::new(&session, &[], 0))))
}

/// Full session snapshot
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    let snapshot = state.get_session.execute(&session_id).await?;
    let online = state.hub.registry().count_for_session(&session_id);
    Ok(Json(SessionView::new(
        &snapshot.session,
        &snapshot.votes,
        online,
    )))
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<StatusCode> {
    state.end_session.execute(&session_id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_review(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<RedirectDto>> {
    let redirect = state.start_review.execute(&session_id, &caller).await?;
    Ok(Json(RedirectDto { redirect }))
}

pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<MembershipDto>> {
    let changed = state.join_session.execute(&session_id, &caller).await?;
    Ok(Json(MembershipDto { changed }))
}

pub async fn leave_session(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<MembershipDto>> {
    let changed = state.leave_session.execute(&session_id, &caller).await?;
    Ok(Json(MembershipDto { changed }))
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
    Json(body): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<TicketDto>)> {
    let title = TicketTitle::new(body.title)?;
    let ticket = state
        .create_ticket
        .execute(&session_id, &caller, title, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(TicketDto::from(&ticket))))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((session_id, ticket_id)): Path<(SessionId, TicketId)>,
    Json(body): Json<UpdateTicketRequest>,
) -> ApiResult<Json<TicketDto>> {
    let edit = TicketEdit {
        title: body.title.map(TicketTitle::new).transpose()?,
        description: body.description,
        final_estimate: body.final_estimate,
    };
    let ticket = state
        .update_ticket
        .execute(&session_id, &caller, ticket_id, edit)
        .await?;
    Ok(Json(TicketDto::from(&ticket)))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((session_id, ticket_id)): Path<(SessionId, TicketId)>,
) -> ApiResult<StatusCode> {
    state
        .delete_ticket
        .execute(&session_id, &caller, ticket_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn select_ticket(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((session_id, ticket_id)): Path<(SessionId, TicketId)>,
) -> ApiResult<Json<TicketDto>> {
    let ticket = state
        .select_ticket
        .execute(&session_id, &caller, ticket_id)
        .await?;
    Ok(Json(TicketDto::from(&ticket)))
}

pub async fn start_voting(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<TicketDto>> {
    let ticket = state.start_voting.execute(&session_id, &caller).await?;
    Ok(Json(TicketDto::from(&ticket)))
}

pub async fn end_voting(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<VotingResultDto>> {
    let (ticket, votes) = state.end_voting.execute(&session_id, &caller).await?;
    Ok(Json(VotingResultDto {
        ticket: TicketDto::from(&ticket),
        votes: votes.iter().map(VoteDto::revealed).collect(),
    }))
}

pub async fn next_ticket(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<CurrentTicketDto>> {
    let ticket = state.advance_ticket.execute(&session_id, &caller).await?;
    Ok(Json(CurrentTicketDto {
        ticket: ticket.as_ref().map(TicketDto::from),
    }))
}

pub async fn submit_vote(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
    Json(body): Json<VoteRequest>,
) -> ApiResult<Json<VoteDto>> {
    let value = VoteValue::new(body.vote)?;
    let vote = state
        .submit_vote
        .execute(&session_id, &caller, value)
        .await?;
    Ok(Json(VoteDto::revealed(&vote)))
}

pub async fn transfer_owner(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(session_id): Path<SessionId>,
    Json(body): Json<TransferOwnerRequest>,
) -> ApiResult<StatusCode> {
    let new_owner = UserId::new(body.new_owner_id)?;
    state
        .transfer_ownership
        .execute(&session_id, &caller, &new_owner)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
