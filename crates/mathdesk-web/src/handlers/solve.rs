//! Solve endpoint: question in, solution out, history appended.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, warn};

use mathdesk_common::{ApiError, HistoryEntry, Query, Solution};

use crate::state::{AppState, SharedState};

/// Characters of the question kept in log lines.
const LOG_PREVIEW_CHARS: usize = 80;

/// POST /solve - run the solver and record the pair on success
///
/// A failed or timed-out solve leaves the history untouched.
pub async fn solve(
    State(state): State<SharedState>,
    payload: Result<Json<Query>, JsonRejection>,
) -> Result<Json<Solution>, ApiError> {
    let Json(query) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected solve request body");
        ApiError::Validation(rejection.body_text())
    })?;

    let Some(question) = query.validated_question() else {
        warn!("Solve request without a question");
        return Err(ApiError::Validation("question must not be empty".to_string()));
    };
    let question = question.to_string();

    let solution = run_solver(&state, &question).await?;
    debug!(question = %preview(&question), solved = solution.is_solved(), "Solved question");

    state
        .history
        .push(HistoryEntry::new(question, solution.clone()))
        .await;

    Ok(Json(solution))
}

/// Runs the solver on the blocking pool so a slow solve never stalls the
/// async workers. On timeout the blocking task is left to finish on its own.
async fn run_solver(state: &AppState, question: &str) -> Result<Solution, ApiError> {
    let solver = Arc::clone(&state.solver);
    let owned = question.to_string();
    let task = tokio::task::spawn_blocking(move || solver.solve(&owned));

    let joined = match state.solve_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| ApiError::SolverTimeout(limit))?,
        None => task.await,
    };

    match joined {
        Ok(Ok(solution)) => Ok(solution),
        Ok(Err(e)) => Err(ApiError::SolverFailure(format!("{:?}: {}", preview(question), e))),
        Err(e) => Err(ApiError::SolverFailure(format!(
            "solver task for {:?} failed: {}",
            preview(question),
            e
        ))),
    }
}

/// First [`LOG_PREVIEW_CHARS`] characters of `question`, marked when cut.
fn preview(question: &str) -> String {
    match question.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &question[..cut], question.len()),
        None => question.to_string(),
    }
}
