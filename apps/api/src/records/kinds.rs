//! The three record kinds. Each one is a marker type tying together its
//! table, stored row, form, category column and empty-state wording, so the
//! listing and submission code is written once.

use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::Table;
use crate::models::options::{Difficulty, EsFormat, InterviewType, UnknownOption};
use crate::models::record::{
    CodingTestForm, CodingTestRecord, InterviewForm, InterviewRecord, NewInterviewRecord,
    RecordHeader, ScreeningForm, ScreeningRecord,
};
use crate::records::submission::{require_text, SubmissionError};

pub trait RecordKind: Send + Sync + 'static {
    /// Stored row as returned by a joined listing.
    type Row: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    /// Submitted form body.
    type Form: DeserializeOwned + Send + 'static;
    /// Insert columns, without the owner.
    type Insert: Serialize + Send + Sync + 'static;
    /// Column the list page narrows by besides the year.
    type Category: Copy
        + Eq
        + FromStr<Err = UnknownOption>
        + Serialize
        + Send
        + Sync
        + 'static;

    const TABLE: Table;
    /// Route path for list + submit.
    const PATH: &'static str;
    const CATEGORY_OPTIONS: &'static [Self::Category];
    /// Shown when the collection itself is empty.
    const EMPTY_MESSAGE: &'static str;
    /// Shown when rows exist but the current filters exclude all of them.
    const NO_MATCH_MESSAGE: &'static str;

    fn header(row: &Self::Row) -> &RecordHeader;
    fn category(row: &Self::Row) -> Self::Category;

    /// Checks required fields and maps the form onto insert columns.
    fn prepare(form: Self::Form) -> Result<Self::Insert, SubmissionError>;
}

/// Entry-sheet (document screening) experiences.
pub struct Screening;

/// Coding-test experiences.
pub struct CodingTest;

/// Interview experiences.
pub struct Interview;

impl RecordKind for Screening {
    type Row = ScreeningRecord;
    type Form = ScreeningForm;
    type Insert = ScreeningForm;
    type Category = EsFormat;

    const TABLE: Table = Table::EsEntries;
    const PATH: &'static str = "/api/v1/es";
    const CATEGORY_OPTIONS: &'static [EsFormat] = EsFormat::ALL;
    const EMPTY_MESSAGE: &'static str = "まだESの登録がありません";
    const NO_MATCH_MESSAGE: &'static str = "条件に一致するESが見つかりませんでした";

    fn header(row: &ScreeningRecord) -> &RecordHeader {
        &row.header
    }

    fn category(row: &ScreeningRecord) -> EsFormat {
        row.es_format
    }

    fn prepare(form: ScreeningForm) -> Result<ScreeningForm, SubmissionError> {
        require_text("会社名", &form.company_name)?;
        require_text("選考職種", &form.job_type)?;
        require_text("ESの内容・テーマ", &form.es_theme)?;
        require_text("ESを書くときに注意したこと", &form.important_points)?;
        require_text("ES対策で行ったこと", &form.preparation_methods)?;
        Ok(form)
    }
}

impl RecordKind for CodingTest {
    type Row = CodingTestRecord;
    type Form = CodingTestForm;
    type Insert = CodingTestForm;
    type Category = Difficulty;

    const TABLE: Table = Table::CodingTests;
    const PATH: &'static str = "/api/v1/coding-tests";
    const CATEGORY_OPTIONS: &'static [Difficulty] = Difficulty::ALL;
    const EMPTY_MESSAGE: &'static str = "まだコーディングテストの情報が登録されていません";
    const NO_MATCH_MESSAGE: &'static str = "条件に一致する情報が見つかりませんでした";

    fn header(row: &CodingTestRecord) -> &RecordHeader {
        &row.header
    }

    fn category(row: &CodingTestRecord) -> Difficulty {
        row.test_difficulty
    }

    fn prepare(form: CodingTestForm) -> Result<CodingTestForm, SubmissionError> {
        require_text("会社名", &form.company_name)?;
        require_text("選考職種", &form.job_type)?;
        require_text("テスト内容", &form.test_contents)?;
        require_text("対策方法", &form.preparation_methods)?;
        require_text("アドバイス", &form.advice)?;
        Ok(form)
    }
}

impl RecordKind for Interview {
    type Row = InterviewRecord;
    type Form = InterviewForm;
    type Insert = NewInterviewRecord;
    type Category = InterviewType;

    const TABLE: Table = Table::Interviews;
    const PATH: &'static str = "/api/v1/interviews";
    const CATEGORY_OPTIONS: &'static [InterviewType] = InterviewType::ALL;
    const EMPTY_MESSAGE: &'static str = "まだ面接情報が登録されていません";
    const NO_MATCH_MESSAGE: &'static str = "条件に一致する面接情報が見つかりませんでした";

    fn header(row: &InterviewRecord) -> &RecordHeader {
        &row.header
    }

    fn category(row: &InterviewRecord) -> InterviewType {
        row.interview_type
    }

    fn prepare(form: InterviewForm) -> Result<NewInterviewRecord, SubmissionError> {
        require_text("会社名", &form.company_name)?;
        require_text("選考職種", &form.job_type)?;
        require_text("質問内容", &form.questions)?;
        require_text("面接の雰囲気", &form.atmosphere)?;
        require_text("対策方法", &form.preparation_methods)?;
        require_text("アドバイス", &form.advice)?;

        Ok(NewInterviewRecord {
            num_of_interviewers: parse_leading_int(&form.num_of_interviewers),
            company_name: form.company_name,
            job_type: form.job_type,
            graduation_year: form.graduation_year,
            interview_type: form.interview_type,
            interview_duration: form.interview_duration,
            interview_format: form.interview_format,
            questions: form.questions,
            atmosphere: form.atmosphere,
            preparation_methods: form.preparation_methods,
            advice: form.advice,
        })
    }
}

/// Reads an optionally signed run of leading ASCII digits ("3人" -> 3).
/// Empty or non-numeric text yields `None`, stored as null; no default is
/// substituted.
pub fn parse_leading_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().ok().map(|n| sign * n)
}
