//! Learning resources exposed by the backend.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A resource type served from one REST collection.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path relative to the API base URL.
    const COLLECTION: &'static str;
}

/// A subject such as Mathematics or Chemistry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for Subject {
    const COLLECTION: &'static str = "/subjects";
}

/// A topic within a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Backend identifier.
    pub id: i64,
    /// Owning subject.
    pub subject_id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for Topic {
    const COLLECTION: &'static str = "/topics";
}

/// A course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Backend identifier.
    pub id: i64,
    /// Course title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Subject the course belongs to.
    #[serde(default)]
    pub subject_id: Option<i64>,
    /// Whether students can see it.
    #[serde(default)]
    pub is_published: bool,
}

impl Resource for Course {
    const COLLECTION: &'static str = "/courses";
}

/// A kind of exam (entrance, certification, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamType {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for ExamType {
    const COLLECTION: &'static str = "/exam-types";
}

/// A timed practice exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeExam {
    /// Backend identifier.
    pub id: i64,
    /// Exam title.
    pub title: String,
    /// Exam type it prepares for.
    pub exam_type_id: i64,
    /// Time limit.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Number of questions.
    #[serde(default)]
    pub question_count: Option<u32>,
}

impl Resource for PracticeExam {
    const COLLECTION: &'static str = "/practice-exams";
}
