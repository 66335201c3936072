//! Payloads of the participant flow: QR draw, question display and submission.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{AnswerEntity, Difficulty, QuestionEntity};

/// Body of `POST /draw`; `team_id` is the raw QR payload.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequest {
    #[validate(length(min = 1, max = 64))]
    pub team_id: String,
}

/// Answer option shown to participants. Correctness is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnswerView {
    pub id: Uuid,
    pub content: String,
}

impl From<AnswerEntity> for AnswerView {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id,
            content: value.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub code: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub images: Vec<String>,
    pub answers: Vec<AnswerView>,
}

impl QuestionView {
    pub fn new(question: QuestionEntity, answers: Vec<AnswerEntity>) -> Self {
        Self {
            id: question.id,
            code: question.code,
            title: question.title,
            description: question.description,
            difficulty: question.difficulty,
            images: question.images,
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a draw: a question, or the exhausted marker.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DrawResponse {
    #[serde(rename_all = "camelCase")]
    Question {
        question_id: Uuid,
        question: QuestionView,
    },
    Exhausted { exhausted: bool },
}

impl DrawResponse {
    pub fn exhausted() -> Self {
        DrawResponse::Exhausted { exhausted: true }
    }
}

/// Body of `POST /submissions`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[validate(length(min = 1, max = 64))]
    pub team_id: String,
    pub question_id: Uuid,
    pub answer_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub correct: bool,
}
