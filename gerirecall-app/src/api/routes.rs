use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gerirecall_core::{CoreError, ExportBundle, ReviewItem, Statistics};
use tokio::task;
use tracing::error;
use uuid::Uuid;

use crate::api::dto::{AddCardIn, ErrorOut, LimitQuery, ReviewIn};
use crate::SharedScheduler;

#[derive(Clone)]
pub struct AppState {
    pub sched: SharedScheduler,
}

pub type ApiError = (StatusCode, Json<ErrorOut>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(err: CoreError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, Json(ErrorOut { error: err.to_string() }))
}

/// Runs a mutating scheduler call off the async workers; it may write the
/// store to disk.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| fail(CoreError::Storage(format!("worker failed: {e}"))))?
        .map_err(fail)
}

pub async fn due_cards(
    State(st): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<ReviewItem>> {
    Json(st.sched.due_cards(q.limit()))
}

pub async fn new_cards(
    State(st): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<ReviewItem>> {
    Json(st.sched.new_cards(q.limit()))
}

pub async fn get_card(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewItem>> {
    st.sched.get(&id).map(Json).map_err(fail)
}

pub async fn add_card(
    State(st): State<AppState>,
    Json(body): Json<AddCardIn>,
) -> ApiResult<(StatusCode, Json<ReviewItem>)> {
    let id = body.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let sched = st.sched.clone();
    let item = blocking(move || {
        sched.add_item(&id, &body.front, &body.back, &body.category, &body.difficulty)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn review_card(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReviewIn>,
) -> ApiResult<Json<ReviewItem>> {
    let sched = st.sched.clone();
    blocking(move || sched.review(&id, body.performance, body.time_spent))
        .await
        .map(Json)
}

pub async fn reset_card(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewItem>> {
    let sched = st.sched.clone();
    blocking(move || sched.reset_card(&id)).await.map(Json)
}

pub async fn delete_card(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let sched = st.sched.clone();
    blocking(move || sched.delete_card(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(State(st): State<AppState>) -> Json<Statistics> {
    Json(st.sched.statistics())
}

pub async fn export(State(st): State<AppState>) -> Json<ExportBundle> {
    Json(st.sched.export())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gerirecall_core::{MemoryStore, PersistencePolicy, Scheduler, Store};
    use std::sync::Arc;

    fn state() -> State<AppState> {
        let store: Box<dyn Store> = Box::new(MemoryStore::new());
        let sched = Scheduler::open(store, PersistencePolicy::Strict).unwrap();
        State(AppState { sched: Arc::new(sched) })
    }

    fn add_body(id: &str) -> Json<AddCardIn> {
        Json(AddCardIn {
            id: Some(id.to_string()),
            front: "Q".into(),
            back: "A".into(),
            category: "falls".into(),
            difficulty: "easy".into(),
        })
    }

    #[tokio::test]
    async fn add_review_and_delete() {
        let st = state();
        let (code, Json(item)) = add_card(st.clone(), add_body("c1")).await.unwrap();
        assert_eq!(code, StatusCode::CREATED);
        assert_eq!(item.id, "c1");

        let Json(due) = due_cards(st.clone(), Query(LimitQuery { limit: None })).await;
        assert_eq!(due.len(), 1);

        let body = Json(ReviewIn { performance: 5, time_spent: 7 });
        let Json(item) = review_card(st.clone(), Path("c1".into()), body).await.unwrap();
        assert_eq!(item.repetitions, 1);
        assert_eq!(item.time_spent, 7);

        let code = delete_card(st.clone(), Path("c1".into())).await.unwrap();
        assert_eq!(code, StatusCode::NO_CONTENT);
        let code = delete_card(st.clone(), Path("c1".into())).await.unwrap();
        assert_eq!(code, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let st = state();
        let err = get_card(st.clone(), Path("missing".into())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        add_card(st.clone(), add_body("c1")).await.unwrap();
        let body = Json(ReviewIn { performance: 9, time_spent: 0 });
        let err = review_card(st.clone(), Path("c1".into()), body).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = reset_card(st, Path("missing".into())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
