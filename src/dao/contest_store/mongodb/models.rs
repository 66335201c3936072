use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    AccountEntity, AnswerEntity, ContestEntity, ContestStatus, Difficulty, MemberEntity,
    QuestionEntity, Role, SchoolEntity, StandingEntity, SubmissionEntity, TeamEntity,
};

pub const CONTEST_COLLECTION: &str = "contest";
pub const SCHOOL_COLLECTION: &str = "schools";
pub const TEAM_COLLECTION: &str = "teams";
pub const MEMBER_COLLECTION: &str = "members";
pub const ACCOUNT_COLLECTION: &str = "accounts";
pub const QUESTION_COLLECTION: &str = "questions";
pub const ANSWER_COLLECTION: &str = "answers";
pub const SUBMISSION_COLLECTION: &str = "submissions";

/// Fixed `_id` of the contest singleton document.
pub const CONTEST_KEY: &str = "contest";

/// Identifiers are stored as hyphenated strings.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn parse_id(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::CorruptDocument {
        collection,
        message: format!("invalid id `{raw}`: {err}"),
    })
}

fn parse_opt_id(collection: &'static str, raw: Option<&str>) -> MongoResult<Option<Uuid>> {
    raw.map(|raw| parse_id(collection, raw)).transpose()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoContestDocument {
    #[serde(rename = "_id")]
    key: String,
    contest_id: String,
    status: ContestStatus,
    start_time: Option<DateTime>,
    end_time: Option<DateTime>,
    paused_time: Option<DateTime>,
    total_paused_duration: i64,
    status_before_pause: Option<ContestStatus>,
    frozen_leaderboard: Option<Vec<MongoStandingDocument>>,
    updated_at: DateTime,
}

impl From<ContestEntity> for MongoContestDocument {
    fn from(value: ContestEntity) -> Self {
        Self {
            key: CONTEST_KEY.to_owned(),
            contest_id: value.id.to_string(),
            status: value.status,
            start_time: value.start_time.map(DateTime::from_system_time),
            end_time: value.end_time.map(DateTime::from_system_time),
            paused_time: value.paused_time.map(DateTime::from_system_time),
            total_paused_duration: i64::try_from(value.total_paused_duration)
                .unwrap_or(i64::MAX),
            status_before_pause: value.status_before_pause,
            frozen_leaderboard: value
                .frozen_leaderboard
                .map(|rows| rows.into_iter().map(Into::into).collect()),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoContestDocument> for ContestEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoContestDocument) -> MongoResult<Self> {
        let frozen_leaderboard = value
            .frozen_leaderboard
            .map(|rows| {
                rows.into_iter()
                    .map(StandingEntity::try_from)
                    .collect::<MongoResult<Vec<_>>>()
            })
            .transpose()?;

        Ok(Self {
            id: parse_id(CONTEST_COLLECTION, &value.contest_id)?,
            status: value.status,
            start_time: value.start_time.map(DateTime::to_system_time),
            end_time: value.end_time.map(DateTime::to_system_time),
            paused_time: value.paused_time.map(DateTime::to_system_time),
            total_paused_duration: u64::try_from(value.total_paused_duration).unwrap_or(0),
            status_before_pause: value.status_before_pause,
            frozen_leaderboard,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

/// Standing row, embedded in frozen snapshots and produced by the standings pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStandingDocument {
    account_id: String,
    username: String,
    team_id: String,
    team_name: String,
    #[serde(default)]
    score: i32,
}

impl From<StandingEntity> for MongoStandingDocument {
    fn from(value: StandingEntity) -> Self {
        Self {
            account_id: value.account_id.to_string(),
            username: value.username,
            team_id: value.team_id.to_string(),
            team_name: value.team_name,
            score: value.score,
        }
    }
}

impl TryFrom<MongoStandingDocument> for StandingEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoStandingDocument) -> MongoResult<Self> {
        Ok(Self {
            account_id: parse_id(ACCOUNT_COLLECTION, &value.account_id)?,
            username: value.username,
            team_id: parse_id(TEAM_COLLECTION, &value.team_id)?,
            team_name: value.team_name,
            score: value.score,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoCountDocument {
    pub count: u64,
}

/// Output of the `$facet` stage used for paginated standings.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoStandingsFacet {
    pub rows: Vec<MongoStandingDocument>,
    pub total: Vec<MongoCountDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSchoolDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    created_at: DateTime,
}

impl From<SchoolEntity> for MongoSchoolDocument {
    fn from(value: SchoolEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoSchoolDocument> for SchoolEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSchoolDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(SCHOOL_COLLECTION, &value.id)?,
            name: value.name,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    school_id: String,
    #[serde(default)]
    score: i32,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            school_id: value.school_id.to_string(),
            score: value.score,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(TEAM_COLLECTION, &value.id)?,
            name: value.name,
            school_id: parse_id(TEAM_COLLECTION, &value.school_id)?,
            score: value.score,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMemberDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    team_id: String,
    created_at: DateTime,
}

impl From<MemberEntity> for MongoMemberDocument {
    fn from(value: MemberEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            team_id: value.team_id.to_string(),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoMemberDocument> for MemberEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMemberDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(MEMBER_COLLECTION, &value.id)?,
            name: value.name,
            team_id: parse_id(MEMBER_COLLECTION, &value.team_id)?,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAccountDocument {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    name: Option<String>,
    password_hash: String,
    role: Role,
    team_id: Option<String>,
    session_token: Option<String>,
    created_at: DateTime,
}

impl From<AccountEntity> for MongoAccountDocument {
    fn from(value: AccountEntity) -> Self {
        Self {
            id: value.id.to_string(),
            username: value.username,
            name: value.name,
            password_hash: value.password_hash,
            role: value.role,
            team_id: value.team_id.map(|id| id.to_string()),
            session_token: value.session_token,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoAccountDocument> for AccountEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoAccountDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(ACCOUNT_COLLECTION, &value.id)?,
            username: value.username,
            name: value.name,
            password_hash: value.password_hash,
            role: value.role,
            team_id: parse_opt_id(ACCOUNT_COLLECTION, value.team_id.as_deref())?,
            session_token: value.session_token,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    code: u32,
    title: String,
    description: String,
    difficulty: Difficulty,
    #[serde(default)]
    images: Vec<String>,
    created_at: DateTime,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            title: value.title,
            description: value.description,
            difficulty: value.difficulty,
            images: value.images,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoQuestionDocument> for QuestionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoQuestionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(QUESTION_COLLECTION, &value.id)?,
            code: value.code,
            title: value.title,
            description: value.description,
            difficulty: value.difficulty,
            images: value.images,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    #[serde(rename = "_id")]
    id: String,
    question_id: String,
    content: String,
    is_correct: bool,
    created_at: DateTime,
}

impl From<AnswerEntity> for MongoAnswerDocument {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            question_id: value.question_id.to_string(),
            content: value.content,
            is_correct: value.is_correct,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoAnswerDocument> for AnswerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoAnswerDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(ANSWER_COLLECTION, &value.id)?,
            question_id: parse_id(ANSWER_COLLECTION, &value.question_id)?,
            content: value.content,
            is_correct: value.is_correct,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubmissionDocument {
    #[serde(rename = "_id")]
    id: String,
    team_id: String,
    question_id: String,
    answer_id: String,
    correct: bool,
    created_at: DateTime,
}

impl From<SubmissionEntity> for MongoSubmissionDocument {
    fn from(value: SubmissionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_id: value.team_id.to_string(),
            question_id: value.question_id.to_string(),
            answer_id: value.answer_id.to_string(),
            correct: value.correct,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoSubmissionDocument> for SubmissionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSubmissionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(SUBMISSION_COLLECTION, &value.id)?,
            team_id: parse_id(SUBMISSION_COLLECTION, &value.team_id)?,
            question_id: parse_id(SUBMISSION_COLLECTION, &value.question_id)?,
            answer_id: parse_id(SUBMISSION_COLLECTION, &value.answer_id)?,
            correct: value.correct,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn contest_document_keeps_pause_bookkeeping() {
        let mut contest = ContestEntity::pending();
        contest.status = ContestStatus::Paused;
        contest.status_before_pause = Some(ContestStatus::Frozen);
        contest.total_paused_duration = 900;
        contest.paused_time = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
        contest.updated_at = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000);

        let document: MongoContestDocument = contest.clone().into();
        assert_eq!(document.key, CONTEST_KEY);
        let restored = ContestEntity::try_from(document).unwrap();
        assert_eq!(restored, contest);
    }

    #[test]
    fn corrupt_identifier_is_reported() {
        let document = MongoSchoolDocument {
            id: "not-a-uuid".into(),
            name: "school".into(),
            created_at: DateTime::now(),
        };
        let err = SchoolEntity::try_from(document).unwrap_err();
        assert!(matches!(
            err,
            MongoDaoError::CorruptDocument {
                collection: SCHOOL_COLLECTION,
                ..
            }
        ));
    }
}
