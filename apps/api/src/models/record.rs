use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::options::{
    Difficulty, Duration, EsFormat, GraduationYear, InterviewFormat, InterviewType,
    ProgrammingLanguage, TestFormat,
};
use crate::models::user::AuthorSummary;

/// Columns shared by all three record tables, plus the joined owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub job_type: String,
    pub graduation_year: GraduationYear,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Stored rows
// ────────────────────────────────────────────────────────────────────────────

/// Entry-sheet (document screening) experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    #[serde(flatten)]
    pub header: RecordHeader,
    pub es_format: EsFormat,
    pub es_theme: String,
    pub important_points: String,
    pub preparation_methods: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingTestRecord {
    #[serde(flatten)]
    pub header: RecordHeader,
    pub test_difficulty: Difficulty,
    pub test_format: TestFormat,
    pub test_duration: Duration,
    /// Absent or null columns read as no languages.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub programming_languages: Vec<ProgrammingLanguage>,
    pub test_contents: String,
    pub preparation_methods: String,
    pub advice: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    #[serde(flatten)]
    pub header: RecordHeader,
    pub interview_type: InterviewType,
    pub interview_duration: Duration,
    pub interview_format: InterviewFormat,
    /// `None` when the submitted count was not a number.
    pub num_of_interviewers: Option<i32>,
    pub questions: String,
    pub atmosphere: String,
    pub preparation_methods: String,
    pub advice: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Submission forms
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningForm {
    pub company_name: String,
    pub job_type: String,
    pub graduation_year: GraduationYear,
    pub es_format: EsFormat,
    pub es_theme: String,
    pub important_points: String,
    pub preparation_methods: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingTestForm {
    pub company_name: String,
    pub job_type: String,
    pub graduation_year: GraduationYear,
    pub test_difficulty: Difficulty,
    pub test_format: TestFormat,
    pub test_duration: Duration,
    #[serde(default)]
    pub programming_languages: Vec<ProgrammingLanguage>,
    pub test_contents: String,
    pub preparation_methods: String,
    pub advice: String,
}

/// The interviewer count arrives as raw form text and is parsed on submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewForm {
    pub company_name: String,
    pub job_type: String,
    pub graduation_year: GraduationYear,
    pub interview_type: InterviewType,
    pub interview_duration: Duration,
    pub interview_format: InterviewFormat,
    #[serde(default)]
    pub num_of_interviewers: String,
    pub questions: String,
    pub atmosphere: String,
    pub preparation_methods: String,
    pub advice: String,
}

/// Insert columns for `interviews` after the count has been parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInterviewRecord {
    pub company_name: String,
    pub job_type: String,
    pub graduation_year: GraduationYear,
    pub interview_type: InterviewType,
    pub interview_duration: Duration,
    pub interview_format: InterviewFormat,
    pub num_of_interviewers: Option<i32>,
    pub questions: String,
    pub atmosphere: String,
    pub preparation_methods: String,
    pub advice: String,
}

/// Id and timestamp the store assigned to a freshly inserted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_row_deserializes_with_author() {
        let row = serde_json::json!({
            "id": "0b5d2f8e-3b7c-4c55-9a0c-1f6d7e2a9b10",
            "user_id": "6f1c7a8e-8a57-4d0e-9d1b-2b7f0f5f9c11",
            "company_name": "Acme",
            "job_type": "エンジニア",
            "graduation_year": "2026年卒",
            "created_at": "2026-04-01T09:30:00Z",
            "es_format": "フォームの回答",
            "es_theme": "自己PR",
            "important_points": "数字で示す",
            "preparation_methods": "OB訪問",
            "author": { "name": "山田太郎", "department": "情報学部" }
        });
        let record: ScreeningRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.header.company_name, "Acme");
        assert_eq!(record.es_format, EsFormat::WebForm);
        let author = record.header.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("山田太郎"));
    }

    #[test]
    fn test_null_programming_languages_read_as_empty() {
        let row = serde_json::json!({
            "id": "0b5d2f8e-3b7c-4c55-9a0c-1f6d7e2a9b10",
            "user_id": "6f1c7a8e-8a57-4d0e-9d1b-2b7f0f5f9c11",
            "company_name": "Initech",
            "job_type": "SRE",
            "graduation_year": "2026年卒",
            "created_at": "2026-04-01T09:30:00Z",
            "test_difficulty": "普通",
            "test_format": "コーディング形式",
            "test_duration": "60分",
            "programming_languages": null,
            "test_contents": "グラフ探索",
            "preparation_methods": "AtCoder",
            "advice": "計算量を意識する"
        });
        let record: CodingTestRecord = serde_json::from_value(row).unwrap();
        assert!(record.programming_languages.is_empty());
    }

    #[test]
    fn test_null_interviewer_count_deserializes() {
        let row = serde_json::json!({
            "id": "0b5d2f8e-3b7c-4c55-9a0c-1f6d7e2a9b10",
            "user_id": "6f1c7a8e-8a57-4d0e-9d1b-2b7f0f5f9c11",
            "company_name": "Globex",
            "job_type": "企画",
            "graduation_year": "2025年卒",
            "created_at": "2026-04-01T09:30:00Z",
            "interview_type": "最終面接",
            "interview_duration": "60分",
            "interview_format": "対面",
            "num_of_interviewers": null,
            "questions": "志望動機",
            "atmosphere": "和やか",
            "preparation_methods": "模擬面接",
            "advice": "落ち着いて"
        });
        let record: InterviewRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.num_of_interviewers, None);
        assert!(record.header.author.is_none());
    }
}
