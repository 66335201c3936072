pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AccountEntity, AnswerEntity, ContestEntity, MemberEntity, QuestionEntity, SchoolEntity,
    StandingEntity, StandingsPage, SubmissionEntity, TeamEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer holding the contest singleton and every
/// record it references.
///
/// Listing methods return rows in stable creation order unless stated otherwise.
pub trait ContestStore: Send + Sync {
    /// Load the contest singleton, creating it in the pending state when absent.
    fn load_contest(&self) -> BoxFuture<'static, StorageResult<ContestEntity>>;
    /// Replace the contest singleton in a single write.
    fn save_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_schools(&self) -> BoxFuture<'static, StorageResult<Vec<SchoolEntity>>>;
    fn find_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SchoolEntity>>>;
    fn save_school(&self, school: SchoolEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a team together with its members, unlinking accounts that reference it.
    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Atomically add `delta` to a team score, returning the updated team.
    fn adjust_team_score(
        &self,
        id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;

    /// List members, optionally restricted to one team.
    fn list_members(
        &self,
        team_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>>;
    fn find_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>>;
    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn list_accounts(&self) -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>>;
    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>>;
    fn find_account_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>>;
    /// Insert a new account; fails with [`StorageError::Duplicate`] on a taken username.
    ///
    /// [`StorageError::Duplicate`]: crate::dao::storage::StorageError::Duplicate
    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing account; fails with `Duplicate` when the new username is taken.
    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Set or clear the active session token of an account.
    fn set_session_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Live standings: USER accounts linked to a team, ordered by team score
    /// descending then account creation ascending, windowed by `skip`/`limit`.
    fn standings_page(&self, skip: u64, limit: u64)
    -> BoxFuture<'static, StorageResult<StandingsPage>>;
    /// Every live standing row in leaderboard order.
    fn all_standings(&self) -> BoxFuture<'static, StorageResult<Vec<StandingEntity>>>;

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn find_question(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a question and its answers.
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Count questions whose id is not in `excluded`.
    fn count_questions_excluding(
        &self,
        excluded: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Fetch the question at `offset` among those not in `excluded`, in creation order.
    fn question_at_excluding(
        &self,
        excluded: Vec<Uuid>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;

    fn list_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;
    fn save_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// First answer flagged correct for the question, if any.
    fn find_correct_answer(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;

    /// Append a submission row.
    fn insert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Distinct question ids the team has submitted for.
    fn submitted_question_ids(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;
    fn list_submissions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
