use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of the contest singleton.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestStatus {
    /// Created but not started yet.
    Pending,
    /// Running; draws and submissions are accepted.
    Running,
    /// Temporarily halted by an administrator.
    Paused,
    /// Running with the public leaderboard frozen.
    Frozen,
    /// Terminal state.
    Finished,
}

/// Role attached to a login identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Participant account, usually linked to a team.
    User,
    /// Contest administrator.
    Admin,
    /// Venue operator (scanning QR codes on behalf of teams).
    Operator,
    /// Judge account.
    Judge,
    /// Super administrator.
    Master,
}

/// Difficulty tag of a question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Persisted representation of the contest singleton.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContestEntity {
    /// Stable identifier of the singleton row.
    pub id: Uuid,
    pub status: ContestStatus,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub paused_time: Option<SystemTime>,
    /// Accumulated pause time in whole seconds.
    pub total_paused_duration: u64,
    pub status_before_pause: Option<ContestStatus>,
    /// Standings captured when the contest was frozen.
    pub frozen_leaderboard: Option<Vec<StandingEntity>>,
    /// Last time the row was written.
    pub updated_at: SystemTime,
}

impl ContestEntity {
    /// Fresh contest row in the initial pending state.
    pub fn pending() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ContestStatus::Pending,
            start_time: None,
            end_time: None,
            paused_time: None,
            total_paused_duration: 0,
            status_before_pause: None,
            frozen_leaderboard: None,
            updated_at: SystemTime::now(),
        }
    }
}

/// One leaderboard row as stored in a frozen snapshot or produced by a live query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingEntity {
    pub account_id: Uuid,
    pub username: String,
    pub team_id: Uuid,
    pub team_name: String,
    pub score: i32,
}

/// A page of live standings together with the total number of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsPage {
    pub rows: Vec<StandingEntity>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchoolEntity {
    pub id: Uuid,
    pub name: String,
    pub created_at: SystemTime,
}

/// Team record; `score` is the aggregate used by the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    pub id: Uuid,
    pub name: String,
    pub school_id: Uuid,
    pub score: i32,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberEntity {
    pub id: Uuid,
    pub name: String,
    pub team_id: Uuid,
    pub created_at: SystemTime,
}

/// Login identity. `session_token` holds the single active session, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntity {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub session_token: Option<String>,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    pub id: Uuid,
    /// Display ordinal, assigned on creation.
    pub code: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Image URLs attached to the question.
    pub images: Vec<String>,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub is_correct: bool,
    pub created_at: SystemTime,
}

/// Append-only ledger row for one answer attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionEntity {
    pub id: Uuid,
    pub team_id: Uuid,
    pub question_id: Uuid,
    pub answer_id: Uuid,
    pub correct: bool,
    pub created_at: SystemTime,
}
