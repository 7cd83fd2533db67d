use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use party_shared::{
    error::ServiceError,
    models::{
        CreateReplierRequest, MessageResponse, PartyReplier, ReplyChange, ReplyRequest,
        ReplyResponse, ReplyTally,
    },
    store::ReplierStore,
};

use crate::error::{AppError, Result};

// Each user may appear at most once across all initial lists
fn validate_initial_replies(replier: &PartyReplier) -> Result<()> {
    let mut seen = HashSet::new();
    for user in replier
        .users_agreed
        .iter()
        .chain(&replier.users_in_thought)
        .chain(&replier.users_refused)
    {
        if user.trim().is_empty() {
            return Err(AppError::BadRequest("User ids must not be empty".into()));
        }
        if !seen.insert(user.as_str()) {
            return Err(AppError::BadRequest(format!(
                "User {} is listed more than once",
                user
            )));
        }
    }
    Ok(())
}

// POST /repliers - Create a replier record owned by the caller
pub async fn create_replier<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(request): Json<CreateReplierRequest>,
) -> Result<(StatusCode, Json<PartyReplier>)> {
    let mut replier = PartyReplier::new(Some(user_id.clone()));
    replier.users_agreed = request.users_agreed;
    replier.users_in_thought = request.users_in_thought;
    replier.users_refused = request.users_refused;

    validate_initial_replies(&replier)?;

    let saved = store.create_replier(replier).await?;
    info!("User {} created replier {}", user_id, saved.id());

    Ok((StatusCode::CREATED, Json(saved)))
}

// GET /repliers/me - Records owned by the caller
pub async fn get_my_repliers<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<Vec<PartyReplier>>> {
    let repliers = store.get_repliers_by_owner(&user_id).await?;
    debug!("Found {} repliers owned by {}", repliers.len(), user_id);
    Ok(Json(repliers))
}

// GET /repliers/replied - Records the caller has replied to
pub async fn get_replied_repliers<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<Vec<PartyReplier>>> {
    let repliers = store.get_repliers_by_participant(&user_id).await?;
    debug!("Found {} repliers with replies from {}", repliers.len(), user_id);
    Ok(Json(repliers))
}

// GET /repliers/:id
pub async fn get_replier<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<PartyReplier>> {
    let replier = store.get_replier(&id).await?;

    let conflicts = replier.conflicting_users();
    if !conflicts.is_empty() {
        warn!("Replier {} lists users under several states: {:?}", id, conflicts);
    }

    Ok(Json(replier))
}

// GET /repliers/:id/tally
pub async fn get_tally<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<ReplyTally>> {
    let replier = store.get_replier(&id).await?;
    Ok(Json(replier.tally()))
}

// Attempts per request before a concurrent-write conflict is returned as 409
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Applies `apply` to the stored record and writes it back if it reports a
/// change. The write is conditional on the version that was read, so a
/// concurrent writer causes a fresh read and another attempt.
async fn modify_replier<S, T, F>(store: &S, id: &str, mut apply: F) -> Result<(T, PartyReplier)>
where
    S: ReplierStore + ?Sized,
    F: FnMut(&mut PartyReplier) -> Result<(T, bool)>,
{
    let mut attempt = 1;
    loop {
        let mut replier = store.get_replier(id).await?;
        let read_at = replier.base.updated_at.clone();

        let (outcome, changed) = apply(&mut replier)?;
        if !changed {
            return Ok((outcome, replier));
        }

        match store.update_replier(replier, &read_at).await {
            Ok(saved) => return Ok((outcome, saved)),
            Err(ServiceError::Conflict(msg)) if attempt < MAX_UPDATE_ATTEMPTS => {
                warn!("Retrying update of {} (attempt {}): {}", id, attempt, msg);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

// PUT /repliers/:id/reply - Record the caller's reply
pub async fn reply<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>> {
    let state = request.state;
    let (change, replier) = modify_replier(store.as_ref(), &id, |replier| {
        let change = replier.record_reply(&user_id, state);
        Ok((change, change != ReplyChange::Unchanged))
    })
    .await?;

    let message = match change {
        ReplyChange::Unchanged => {
            debug!("User {} already replied {} to {}", user_id, state, id);
            format!("Reply already recorded as {}", state)
        }
        ReplyChange::Added => {
            info!("User {} replied {} to {}", user_id, state, id);
            format!("Reply recorded as {}", state)
        }
        ReplyChange::Moved { from } => {
            info!("User {} changed reply to {} from {} on {}", user_id, state, from, id);
            format!("Reply changed from {} to {}", from, state)
        }
    };

    Ok(Json(ReplyResponse {
        message,
        state: Some(state),
        replier,
    }))
}

// DELETE /repliers/:id/reply - Withdraw the caller's reply
pub async fn withdraw_reply<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<ReplyResponse>> {
    let (previous, replier) = modify_replier(store.as_ref(), &id, |replier| {
        match replier.withdraw_reply(&user_id) {
            Some(previous) => Ok((previous, true)),
            None => Err(AppError::NotFound(format!(
                "User {} has no reply on {}",
                user_id, id
            ))),
        }
    })
    .await?;
    info!("User {} withdrew their {} reply from {}", user_id, previous, id);

    Ok(Json(ReplyResponse {
        message: format!("Reply {} withdrawn", previous),
        state: None,
        replier,
    }))
}

// DELETE /repliers/:id - Owner only
pub async fn delete_replier<S: ReplierStore + ?Sized>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>> {
    let replier = store.get_replier(&id).await?;

    if !replier.is_owned_by(&user_id) {
        warn!("User {} tried to delete replier {} they do not own", user_id, id);
        return Err(AppError::Forbidden(format!(
            "Replier {} is not owned by user",
            id
        )));
    }

    store.delete_replier(&id).await?;
    info!("User {} deleted replier {}", user_id, id);

    Ok(Json(MessageResponse {
        message: format!("Replier {} deleted", id),
    }))
}
