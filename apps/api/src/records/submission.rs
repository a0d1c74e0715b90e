use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::backend::{BackendError, RecordStore};
use crate::errors::AppError;
use crate::models::record::SubmittedRecord;
use crate::records::kinds::RecordKind;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("required field '{field}' is empty")]
    MissingField { field: &'static str },

    #[error("encoding insert payload failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("insert failed: {0}")]
    Store(#[source] BackendError),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::MissingField { field } => {
                AppError::Validation(format!("{field}を入力してください"))
            }
            SubmissionError::Store(BackendError::Unauthorized) => AppError::Unauthorized,
            SubmissionError::Store(e) => {
                AppError::remote("登録に失敗しました。もう一度お試しください。", e)
            }
            SubmissionError::Encode(e) => {
                AppError::Internal(anyhow::Error::new(e).context("encoding insert payload"))
            }
        }
    }
}

/// Required-field check applied to free-text form inputs.
pub fn require_text(field: &'static str, value: &str) -> Result<(), SubmissionError> {
    if value.trim().is_empty() {
        return Err(SubmissionError::MissingField { field });
    }
    Ok(())
}

/// Insert payload: the prepared columns plus the owner.
#[derive(Debug, Serialize)]
struct OwnedRow<'a, T> {
    user_id: Uuid,
    #[serde(flatten)]
    fields: &'a T,
}

/// Inserts a prepared record owned by the session's user.
pub async fn submit_record<K: RecordKind>(
    store: &dyn RecordStore,
    session: &Session,
    insert: &K::Insert,
) -> Result<SubmittedRecord, SubmissionError> {
    let row = serde_json::to_value(OwnedRow {
        user_id: session.user.id,
        fields: insert,
    })?;

    let stored = store
        .insert(&session.access_token, K::TABLE, row)
        .await
        .map_err(SubmissionError::Store)?;
    let submitted: SubmittedRecord =
        serde_json::from_value(stored).map_err(|e| SubmissionError::Store(e.into()))?;

    info!(
        "User {} registered {} row {}",
        session.user.id,
        K::TABLE,
        submitted.id
    );
    Ok(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::backend::memory::FailurePoint;
    use crate::backend::{AuthProvider, InMemoryBackend, Table};
    use crate::models::options::{Difficulty, Duration, GraduationYear, ProgrammingLanguage, TestFormat};
    use crate::models::record::CodingTestForm;
    use crate::records::kinds::CodingTest;

    async fn session(backend: &InMemoryBackend) -> Session {
        backend
            .send_sign_in_link("hanako@example-u.ac.jp", None)
            .await
            .unwrap();
        let auth = backend
            .confirm_sign_in_link("hanako@example-u.ac.jp")
            .await
            .unwrap();
        Session {
            access_token: auth.access_token,
            user: auth.user,
        }
    }

    fn form() -> CodingTestForm {
        CodingTestForm {
            company_name: "Acme".to_string(),
            job_type: "バックエンド".to_string(),
            graduation_year: GraduationYear::Y2027,
            test_difficulty: Difficulty::Hard,
            test_format: TestFormat::Coding,
            test_duration: Duration::Min90,
            programming_languages: vec![ProgrammingLanguage::Python, ProgrammingLanguage::Go],
            test_contents: "グラフ探索".to_string(),
            preparation_methods: "過去問".to_string(),
            advice: "計算量を意識".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submission_attaches_owner() {
        let backend = Arc::new(InMemoryBackend::default());
        let session = session(&backend).await;

        let insert = CodingTest::prepare(form()).unwrap();
        let submitted = submit_record::<CodingTest>(backend.as_ref(), &session, &insert)
            .await
            .unwrap();

        let rows = backend
            .select_with_author(&session.access_token, Table::CodingTests)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], serde_json::json!(submitted.id));
        assert_eq!(rows[0]["user_id"], serde_json::json!(session.user.id));
        assert_eq!(rows[0]["programming_languages"], serde_json::json!(["Python", "Go"]));
        assert_eq!(rows[0]["test_difficulty"], "難しい");
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let backend = Arc::new(InMemoryBackend::default());
        let session = session(&backend).await;
        backend.fail_next(FailurePoint::Insert).await;

        let insert = CodingTest::prepare(form()).unwrap();
        let err = submit_record::<CodingTest>(backend.as_ref(), &session, &insert)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Store(_)));
        let app: AppError = err.into();
        assert_eq!(app.user_message(), "登録に失敗しました。もう一度お試しください。");
    }

    #[tokio::test]
    async fn test_revoked_session_is_unauthorized() {
        let backend = Arc::new(InMemoryBackend::default());
        let session = session(&backend).await;
        backend.sign_out(&session.access_token).await.unwrap();

        let insert = CodingTest::prepare(form()).unwrap();
        let err = submit_record::<CodingTest>(backend.as_ref(), &session, &insert)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Unauthorized));
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("会社名", "Acme").is_ok());
        assert!(matches!(
            require_text("会社名", " \n"),
            Err(SubmissionError::MissingField { field: "会社名" })
        ));
    }
}
