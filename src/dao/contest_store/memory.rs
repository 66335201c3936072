//! In-process [`ContestStore`] used for local runs and tests.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContestStore;
use crate::dao::{
    models::{
        AccountEntity, AnswerEntity, ContestEntity, MemberEntity, QuestionEntity, Role,
        SchoolEntity, StandingEntity, StandingsPage, SubmissionEntity, TeamEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Failure injected when the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct MemoryStoreOffline;

#[derive(Default)]
struct Tables {
    contest: Option<ContestEntity>,
    schools: IndexMap<Uuid, SchoolEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    members: IndexMap<Uuid, MemberEntity>,
    accounts: IndexMap<Uuid, AccountEntity>,
    questions: IndexMap<Uuid, QuestionEntity>,
    answers: IndexMap<Uuid, AnswerEntity>,
    submissions: Vec<SubmissionEntity>,
}

struct MemoryInner {
    tables: RwLock<Tables>,
    usernames: DashMap<String, Uuid>,
    online: AtomicBool,
}

/// Volatile store keeping every table in insertion order.
#[derive(Clone)]
pub struct MemoryContestStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryContestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContestStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                tables: RwLock::new(Tables::default()),
                usernames: DashMap::new(),
                online: AtomicBool::new(true),
            }),
        }
    }

    /// Toggle availability; while offline every call fails with `Unavailable`.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::unavailable(
                "in-memory store offline".into(),
                MemoryStoreOffline,
            ))
        }
    }

    /// Run a read-only closure over the tables.
    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Tables) -> T + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let tables = store.inner.tables.read().await;
            Ok(f(&tables))
        })
    }

    /// Run a mutating closure over the tables.
    fn write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables, &DashMap<String, Uuid>) -> StorageResult<T> + Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut tables = store.inner.tables.write().await;
            f(&mut tables, &store.inner.usernames)
        })
    }
}

fn standings(tables: &Tables) -> Vec<StandingEntity> {
    let mut rows: Vec<(&AccountEntity, &TeamEntity)> = tables
        .accounts
        .values()
        .filter(|account| account.role == Role::User)
        .filter_map(|account| {
            let team = tables.teams.get(&account.team_id?)?;
            Some((account, team))
        })
        .collect();

    rows.sort_by(|(a_acc, a_team), (b_acc, b_team)| {
        b_team
            .score
            .cmp(&a_team.score)
            .then_with(|| a_acc.created_at.cmp(&b_acc.created_at))
    });

    rows.into_iter()
        .map(|(account, team)| StandingEntity {
            account_id: account.id,
            username: account.username.clone(),
            team_id: team.id,
            team_name: team.name.clone(),
            score: team.score,
        })
        .collect()
}

fn claim_username(
    usernames: &DashMap<String, Uuid>,
    username: &str,
    id: Uuid,
) -> StorageResult<()> {
    match usernames.entry(username.to_owned()) {
        Entry::Occupied(entry) if *entry.get() != id => Err(StorageError::duplicate(format!(
            "username `{username}` already exists"
        ))),
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(entry) => {
            entry.insert(id);
            Ok(())
        }
    }
}

impl ContestStore for MemoryContestStore {
    fn load_contest(&self) -> BoxFuture<'static, StorageResult<ContestEntity>> {
        self.write(|tables, _| Ok(tables.contest.get_or_insert_with(ContestEntity::pending).clone()))
    }

    fn save_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.contest = Some(contest);
            Ok(())
        })
    }

    fn list_schools(&self) -> BoxFuture<'static, StorageResult<Vec<SchoolEntity>>> {
        self.read(|tables| tables.schools.values().cloned().collect())
    }

    fn find_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SchoolEntity>>> {
        self.read(move |tables| tables.schools.get(&id).cloned())
    }

    fn save_school(&self, school: SchoolEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.schools.insert(school.id, school);
            Ok(())
        })
    }

    fn delete_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| Ok(tables.schools.shift_remove(&id).is_some()))
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        self.read(|tables| tables.teams.values().cloned().collect())
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.read(move |tables| tables.teams.get(&id).cloned())
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| {
            if tables.teams.shift_remove(&id).is_none() {
                return Ok(false);
            }
            tables.members.retain(|_, member| member.team_id != id);
            for account in tables.accounts.values_mut() {
                if account.team_id == Some(id) {
                    account.team_id = None;
                }
            }
            Ok(true)
        })
    }

    fn adjust_team_score(
        &self,
        id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.write(move |tables, _| {
            Ok(tables.teams.get_mut(&id).map(|team| {
                team.score = team.score.saturating_add(delta);
                team.clone()
            }))
        })
    }

    fn list_members(
        &self,
        team_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        self.read(move |tables| {
            tables
                .members
                .values()
                .filter(|member| team_id.is_none_or(|team| member.team_id == team))
                .cloned()
                .collect()
        })
    }

    fn find_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>> {
        self.read(move |tables| tables.members.get(&id).cloned())
    }

    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.members.insert(member.id, member);
            Ok(())
        })
    }

    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| Ok(tables.members.shift_remove(&id).is_some()))
    }

    fn list_accounts(&self) -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>> {
        self.read(|tables| tables.accounts.values().cloned().collect())
    }

    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        self.read(move |tables| tables.accounts.get(&id).cloned())
    }

    fn find_account_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        self.read(move |tables| {
            tables
                .accounts
                .values()
                .find(|account| account.username == username)
                .cloned()
        })
    }

    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, usernames| {
            if usernames.contains_key(&account.username) {
                return Err(StorageError::duplicate(format!(
                    "username `{}` already exists",
                    account.username
                )));
            }
            usernames.insert(account.username.clone(), account.id);
            tables.accounts.insert(account.id, account);
            Ok(())
        })
    }

    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, usernames| {
            claim_username(usernames, &account.username, account.id)?;
            if let Some(previous) = tables.accounts.get(&account.id)
                && previous.username != account.username
            {
                usernames.remove(&previous.username);
            }
            tables.accounts.insert(account.id, account);
            Ok(())
        })
    }

    fn delete_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, usernames| match tables.accounts.shift_remove(&id) {
            Some(account) => {
                usernames.remove(&account.username);
                Ok(true)
            }
            None => Ok(false),
        })
    }

    fn set_session_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| match tables.accounts.get_mut(&id) {
            Some(account) => {
                account.session_token = token;
                Ok(true)
            }
            None => Ok(false),
        })
    }

    fn standings_page(
        &self,
        skip: u64,
        limit: u64,
    ) -> BoxFuture<'static, StorageResult<StandingsPage>> {
        self.read(move |tables| {
            let all = standings(tables);
            let total = all.len() as u64;
            let rows = all
                .into_iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect();
            StandingsPage { rows, total }
        })
    }

    fn all_standings(&self) -> BoxFuture<'static, StorageResult<Vec<StandingEntity>>> {
        self.read(standings)
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.read(|tables| tables.questions.values().cloned().collect())
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        self.read(move |tables| tables.questions.get(&id).cloned())
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.questions.insert(question.id, question);
            Ok(())
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| {
            if tables.questions.shift_remove(&id).is_none() {
                return Ok(false);
            }
            tables.answers.retain(|_, answer| answer.question_id != id);
            Ok(true)
        })
    }

    fn count_questions_excluding(
        &self,
        excluded: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.read(move |tables| {
            let excluded: HashSet<Uuid> = excluded.into_iter().collect();
            tables
                .questions
                .keys()
                .filter(|id| !excluded.contains(id))
                .count() as u64
        })
    }

    fn question_at_excluding(
        &self,
        excluded: Vec<Uuid>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        self.read(move |tables| {
            let excluded: HashSet<Uuid> = excluded.into_iter().collect();
            let offset = usize::try_from(offset).ok()?;
            tables
                .questions
                .values()
                .filter(|question| !excluded.contains(&question.id))
                .nth(offset)
                .cloned()
        })
    }

    fn list_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        self.read(move |tables| {
            tables
                .answers
                .values()
                .filter(|answer| answer.question_id == question_id)
                .cloned()
                .collect()
        })
    }

    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.read(move |tables| tables.answers.get(&id).cloned())
    }

    fn save_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.answers.insert(answer.id, answer);
            Ok(())
        })
    }

    fn delete_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |tables, _| Ok(tables.answers.shift_remove(&id).is_some()))
    }

    fn find_correct_answer(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.read(move |tables| {
            tables
                .answers
                .values()
                .find(|answer| answer.question_id == question_id && answer.is_correct)
                .cloned()
        })
    }

    fn insert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |tables, _| {
            tables.submissions.push(submission);
            Ok(())
        })
    }

    fn submitted_question_ids(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        self.read(move |tables| {
            let mut seen = HashSet::new();
            tables
                .submissions
                .iter()
                .filter(|submission| submission.team_id == team_id)
                .map(|submission| submission.question_id)
                .filter(|id| seen.insert(*id))
                .collect()
        })
    }

    fn list_submissions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        self.read(move |tables| {
            tables
                .submissions
                .iter()
                .filter(|submission| submission.team_id == team_id)
                .cloned()
                .collect()
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}
