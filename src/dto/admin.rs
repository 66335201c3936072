//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        AnswerEntity, Difficulty, MemberEntity, QuestionEntity, Role, SchoolEntity, TeamEntity,
    },
    dto::{
        format_system_time,
        validation::{validate_image_urls, validate_username},
    },
};

/// Create or rename a school.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SchoolInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

impl From<SchoolEntity> for SchoolRecord {
    fn from(value: SchoolEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Update a team. The score is only changed through score adjustments.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub school_id: Uuid,
}

/// Create a team, optionally registering its first member in the same call.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub school_id: Uuid,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub member_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: Uuid,
    pub name: String,
    pub school_id: Uuid,
    pub score: i32,
    pub created_at: String,
}

impl From<TeamEntity> for TeamRecord {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            school_id: value.school_id,
            score: value.score,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Request to adjust a team's score by a delta.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreAdjustmentRequest {
    pub delta: i32,
}

/// QR code content for a team: the raw team id.
#[derive(Debug, Serialize, ToSchema)]
pub struct QrPayload {
    pub payload: String,
}

/// Optional team filter for `GET /admin/members`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilter {
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: Uuid,
    pub name: String,
    pub team_id: Uuid,
    pub created_at: String,
}

impl From<MemberEntity> for MemberRecord {
    fn from(value: MemberEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            team_id: value.team_id,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Create or update a question; the display code is assigned by the server.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub is_correct: bool,
    pub created_at: String,
}

impl From<AnswerEntity> for AnswerRecord {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id,
            question_id: value.question_id,
            content: value.content,
            is_correct: value.is_correct,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Admin view of a question, including correctness flags of its answers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: Uuid,
    pub code: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub images: Vec<String>,
    pub created_at: String,
    pub answers: Vec<AnswerRecord>,
}

impl QuestionRecord {
    pub fn new(question: QuestionEntity, answers: Vec<AnswerEntity>) -> Self {
        Self {
            id: question.id,
            code: question.code,
            title: question.title,
            description: question.description,
            difficulty: question.difficulty,
            images: question.images,
            created_at: format_system_time(question.created_at),
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1))]
    pub content: String,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

/// Replace account details; `password` is only changed when present.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Role,
    pub team_id: Option<Uuid>,
}
