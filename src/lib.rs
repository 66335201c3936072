//! Library crate for the contest backend, exposing modules for the server and
//! documentation binaries.

pub mod auth;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by unit tests: an in-memory state and seed helpers.

    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use uuid::Uuid;

    use crate::{
        auth::{Actor, jwt::JwtKeys, password::hash_password},
        config::AppConfig,
        dao::{
            contest_store::{ContestStore, memory::MemoryContestStore},
            models::{
                AccountEntity, AnswerEntity, Difficulty, QuestionEntity, Role, SchoolEntity,
                SubmissionEntity, TeamEntity,
            },
        },
        state::{AppState, SharedState},
    };

    /// Fresh state backed by an installed in-memory store.
    pub async fn memory_state() -> (SharedState, Arc<MemoryContestStore>) {
        let state = AppState::new(AppConfig::default(), JwtKeys::from_secret(b"test-secret"));
        let store = Arc::new(MemoryContestStore::new());
        state.install_store(store.clone()).await;
        (state, store)
    }

    pub fn actor(role: Role) -> Actor {
        Actor {
            account_id: Uuid::new_v4(),
            username: format!("{role:?}").to_lowercase(),
            role,
            team_id: None,
        }
    }

    pub async fn seed_school(store: &MemoryContestStore, name: &str) -> SchoolEntity {
        let school = SchoolEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: SystemTime::now(),
        };
        store.save_school(school.clone()).await.unwrap();
        school
    }

    pub async fn seed_team(store: &MemoryContestStore, name: &str, score: i32) -> TeamEntity {
        let school = seed_school(store, &format!("{name} school")).await;
        let team = TeamEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            school_id: school.id,
            score,
            created_at: SystemTime::now(),
        };
        store.save_team(team.clone()).await.unwrap();
        team
    }

    /// Account with a real argon2 hash, usable for login.
    pub async fn seed_account(
        store: &MemoryContestStore,
        username: &str,
        password: &str,
        role: Role,
        team_id: Option<Uuid>,
    ) -> AccountEntity {
        let account = AccountEntity {
            id: Uuid::new_v4(),
            username: username.into(),
            name: None,
            password_hash: hash_password(password).unwrap(),
            role,
            team_id,
            session_token: None,
            created_at: SystemTime::now(),
        };
        store.insert_account(account.clone()).await.unwrap();
        account
    }

    /// USER account that cannot log in; enough for standings.
    pub async fn seed_participant(
        store: &MemoryContestStore,
        username: &str,
        team_id: Option<Uuid>,
    ) -> AccountEntity {
        let count = store.list_accounts().await.unwrap().len() as u64;
        let account = AccountEntity {
            id: Uuid::new_v4(),
            username: username.into(),
            name: None,
            password_hash: "!".into(),
            role: Role::User,
            team_id,
            session_token: None,
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 + count),
        };
        store.insert_account(account.clone()).await.unwrap();
        account
    }

    /// Question with answers given as `(content, is_correct)` pairs.
    pub async fn seed_question(
        store: &MemoryContestStore,
        title: &str,
        answers: &[(&str, bool)],
    ) -> (QuestionEntity, Vec<AnswerEntity>) {
        let code = store.list_questions().await.unwrap().len() as u32 + 1;
        let question = QuestionEntity {
            id: Uuid::new_v4(),
            code,
            title: title.into(),
            description: format!("{title} description"),
            difficulty: Difficulty::Easy,
            images: vec![],
            created_at: SystemTime::now(),
        };
        store.save_question(question.clone()).await.unwrap();

        let mut seeded = Vec::with_capacity(answers.len());
        for (content, is_correct) in answers {
            let answer = AnswerEntity {
                id: Uuid::new_v4(),
                question_id: question.id,
                content: (*content).into(),
                is_correct: *is_correct,
                created_at: SystemTime::now(),
            };
            store.save_answer(answer.clone()).await.unwrap();
            seeded.push(answer);
        }
        (question, seeded)
    }

    pub async fn record_submission(
        store: &MemoryContestStore,
        team_id: Uuid,
        question_id: Uuid,
        answer_id: Uuid,
    ) {
        store
            .insert_submission(SubmissionEntity {
                id: Uuid::new_v4(),
                team_id,
                question_id,
                answer_id,
                correct: false,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
    }
}
