use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, MethodRouter},
    Json,
};
use tracing::debug;

use crate::errors::AppError;
use crate::extract::{JsonBody, QueryParams};
use crate::models::record::SubmittedRecord;
use crate::records::filter::ListQuery;
use crate::records::kinds::RecordKind;
use crate::records::listing::{fetch_listing, Listing};
use crate::records::submission::submit_record;
use crate::session::BearerToken;
use crate::state::AppState;

/// GET + POST on `K::PATH`.
pub fn record_routes<K: RecordKind>() -> MethodRouter<AppState> {
    get(handle_list::<K>).post(handle_submit::<K>)
}

/// GET /api/v1/{es,coding-tests,interviews}?q=&category=&year=
pub async fn handle_list<K: RecordKind>(
    State(state): State<AppState>,
    token: BearerToken,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Listing<K::Row, K::Category>>, AppError> {
    let filter = query.into_filter::<K::Category>().map_err(|e| {
        debug!("Rejected list filter: {e}");
        AppError::Validation("検索条件が正しくありません".to_string())
    })?;

    let (session, _profile) = state.provisioning.require_complete(token).await?;
    let listing = fetch_listing::<K>(state.store.as_ref(), &session, &filter)
        .await
        .map_err(|e| AppError::remote("情報の取得に失敗しました", e))?;
    Ok(Json(listing))
}

/// POST /api/v1/{es,coding-tests,interviews}
pub async fn handle_submit<K: RecordKind>(
    State(state): State<AppState>,
    token: BearerToken,
    JsonBody(form): JsonBody<K::Form>,
) -> Result<(StatusCode, Json<SubmittedRecord>), AppError> {
    let insert = K::prepare(form)?;

    let (session, _profile) = state.provisioning.require_complete(token).await?;
    let submitted = submit_record::<K>(state.store.as_ref(), &session, &insert).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}
