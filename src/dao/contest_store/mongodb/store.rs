use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Bson, Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        ACCOUNT_COLLECTION, ANSWER_COLLECTION, CONTEST_COLLECTION, CONTEST_KEY, MEMBER_COLLECTION,
        MongoAccountDocument, MongoAnswerDocument, MongoContestDocument, MongoMemberDocument,
        MongoQuestionDocument, MongoSchoolDocument, MongoStandingDocument, MongoStandingsFacet,
        MongoSubmissionDocument, MongoTeamDocument, QUESTION_COLLECTION, SCHOOL_COLLECTION,
        SUBMISSION_COLLECTION, TEAM_COLLECTION, doc_id,
    },
};
use crate::dao::{
    contest_store::ContestStore,
    models::{
        AccountEntity, AnswerEntity, ContestEntity, MemberEntity, QuestionEntity, SchoolEntity,
        StandingEntity, StandingsPage, SubmissionEntity, TeamEntity,
    },
    storage::StorageResult,
};

/// MongoDB-backed [`ContestStore`] implementation.
#[derive(Clone)]
pub struct MongoContestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Sort used wherever creation order is promised.
fn creation_order() -> Document {
    doc! {"created_at": 1, "_id": 1}
}

fn id_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

impl MongoContestStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let indexes: [(&'static str, &'static str, Document, bool); 5] = [
            (ACCOUNT_COLLECTION, "username", doc! {"username": 1}, true),
            (TEAM_COLLECTION, "score", doc! {"score": -1}, false),
            (MEMBER_COLLECTION, "team_id", doc! {"team_id": 1}, false),
            (ANSWER_COLLECTION, "question_id", doc! {"question_id": 1}, false),
            (
                SUBMISSION_COLLECTION,
                "team_id,question_id",
                doc! {"team_id": 1, "question_id": 1},
                false,
            ),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &'static str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn find_many<D, E>(
        &self,
        name: &'static str,
        filter: Document,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(name)
            .await
            .find(filter)
            .sort(creation_order())
            .await
            .map_err(|source| MongoDaoError::read(name, source))?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::read(name, source))?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn find_one<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        self.collection::<D>(name)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::read(name, source))?
            .map(E::try_from)
            .transpose()
    }

    async fn upsert<D>(&self, name: &'static str, id: Uuid, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(name)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write(name, source))?;
        Ok(())
    }

    async fn delete_by_id(&self, name: &'static str, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(name)
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::write(name, source))?;
        Ok(result.deleted_count > 0)
    }

    async fn load_contest(&self) -> MongoResult<ContestEntity> {
        let filter = doc! {"_id": CONTEST_KEY};
        if let Some(contest) = self
            .find_one::<MongoContestDocument, ContestEntity>(CONTEST_COLLECTION, filter.clone())
            .await?
        {
            return Ok(contest);
        }

        let pending: MongoContestDocument = ContestEntity::pending().into();
        match self
            .collection::<MongoContestDocument>(CONTEST_COLLECTION)
            .await
            .insert_one(&pending)
            .await
        {
            Ok(_) => {}
            // Another instance created the singleton first.
            Err(err) if is_duplicate_key(&err) => {}
            Err(source) => return Err(MongoDaoError::write(CONTEST_COLLECTION, source)),
        }

        self.find_one::<MongoContestDocument, ContestEntity>(CONTEST_COLLECTION, filter)
            .await?
            .ok_or_else(|| MongoDaoError::CorruptDocument {
                collection: CONTEST_COLLECTION,
                message: "contest singleton vanished after creation".into(),
            })
    }

    async fn save_contest(&self, contest: ContestEntity) -> MongoResult<()> {
        let document: MongoContestDocument = contest.into();
        self.collection::<MongoContestDocument>(CONTEST_COLLECTION)
            .await
            .replace_one(doc! {"_id": CONTEST_KEY}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::write(CONTEST_COLLECTION, source))?;
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> MongoResult<bool> {
        if !self.delete_by_id(TEAM_COLLECTION, id).await? {
            return Ok(false);
        }

        let team_id = id.to_string();
        self.collection::<Document>(MEMBER_COLLECTION)
            .await
            .delete_many(doc! {"team_id": team_id.as_str()})
            .await
            .map_err(|source| MongoDaoError::write(MEMBER_COLLECTION, source))?;
        self.collection::<Document>(ACCOUNT_COLLECTION)
            .await
            .update_many(
                doc! {"team_id": team_id.as_str()},
                doc! {"$set": {"team_id": Bson::Null}},
            )
            .await
            .map_err(|source| MongoDaoError::write(ACCOUNT_COLLECTION, source))?;
        Ok(true)
    }

    async fn adjust_team_score(&self, id: Uuid, delta: i32) -> MongoResult<Option<TeamEntity>> {
        self.collection::<MongoTeamDocument>(TEAM_COLLECTION)
            .await
            .find_one_and_update(doc_id(id), doc! {"$inc": {"score": delta}})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::write(TEAM_COLLECTION, source))?
            .map(TeamEntity::try_from)
            .transpose()
    }

    async fn insert_account(&self, account: AccountEntity) -> MongoResult<()> {
        let document: MongoAccountDocument = account.into();
        self.collection::<MongoAccountDocument>(ACCOUNT_COLLECTION)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::write(ACCOUNT_COLLECTION, source))?;
        Ok(())
    }

    async fn set_session_token(&self, id: Uuid, token: Option<String>) -> MongoResult<bool> {
        let token = token.map(Bson::String).unwrap_or(Bson::Null);
        let result = self
            .collection::<Document>(ACCOUNT_COLLECTION)
            .await
            .update_one(doc_id(id), doc! {"$set": {"session_token": token}})
            .await
            .map_err(|source| MongoDaoError::write(ACCOUNT_COLLECTION, source))?;
        Ok(result.matched_count > 0)
    }

    fn standings_pipeline() -> Vec<Document> {
        vec![
            doc! {"$match": {"role": "USER", "team_id": {"$ne": Bson::Null}}},
            doc! {"$lookup": {
                "from": TEAM_COLLECTION,
                "localField": "team_id",
                "foreignField": "_id",
                "as": "team",
            }},
            doc! {"$unwind": "$team"},
            doc! {"$sort": {"team.score": -1, "created_at": 1, "_id": 1}},
            doc! {"$project": {
                "_id": 0,
                "account_id": "$_id",
                "username": 1,
                "team_id": "$team._id",
                "team_name": "$team.name",
                "score": {"$ifNull": ["$team.score", 0]},
            }},
        ]
    }

    async fn standings_page(&self, skip: u64, limit: u64) -> MongoResult<StandingsPage> {
        let skip = i64::try_from(skip).unwrap_or(i64::MAX);
        // `$limit` rejects zero.
        let limit = i64::try_from(limit).unwrap_or(i64::MAX).max(1);

        let mut pipeline = Self::standings_pipeline();
        pipeline.push(doc! {"$facet": {
            "rows": [{"$skip": skip}, {"$limit": limit}],
            "total": [{"$count": "count"}],
        }});

        let facet = self
            .collection::<Document>(ACCOUNT_COLLECTION)
            .await
            .aggregate(pipeline)
            .with_type::<MongoStandingsFacet>()
            .await
            .map_err(|source| MongoDaoError::read(ACCOUNT_COLLECTION, source))?
            .try_next()
            .await
            .map_err(|source| MongoDaoError::read(ACCOUNT_COLLECTION, source))?;

        let Some(facet) = facet else {
            return Ok(StandingsPage {
                rows: Vec::new(),
                total: 0,
            });
        };

        let total = facet.total.first().map(|count| count.count).unwrap_or(0);
        let rows = facet
            .rows
            .into_iter()
            .map(StandingEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        Ok(StandingsPage { rows, total })
    }

    async fn all_standings(&self) -> MongoResult<Vec<StandingEntity>> {
        let documents: Vec<MongoStandingDocument> = self
            .collection::<Document>(ACCOUNT_COLLECTION)
            .await
            .aggregate(Self::standings_pipeline())
            .with_type::<MongoStandingDocument>()
            .await
            .map_err(|source| MongoDaoError::read(ACCOUNT_COLLECTION, source))?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::read(ACCOUNT_COLLECTION, source))?;

        documents.into_iter().map(StandingEntity::try_from).collect()
    }

    async fn delete_question(&self, id: Uuid) -> MongoResult<bool> {
        if !self.delete_by_id(QUESTION_COLLECTION, id).await? {
            return Ok(false);
        }
        self.collection::<Document>(ANSWER_COLLECTION)
            .await
            .delete_many(doc! {"question_id": id.to_string()})
            .await
            .map_err(|source| MongoDaoError::write(ANSWER_COLLECTION, source))?;
        Ok(true)
    }

    async fn count_questions_excluding(&self, excluded: Vec<Uuid>) -> MongoResult<u64> {
        self.collection::<Document>(QUESTION_COLLECTION)
            .await
            .count_documents(doc! {"_id": {"$nin": id_strings(&excluded)}})
            .await
            .map_err(|source| MongoDaoError::read(QUESTION_COLLECTION, source))
    }

    async fn question_at_excluding(
        &self,
        excluded: Vec<Uuid>,
        offset: u64,
    ) -> MongoResult<Option<QuestionEntity>> {
        let document = self
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION)
            .await
            .find(doc! {"_id": {"$nin": id_strings(&excluded)}})
            .sort(creation_order())
            .skip(offset)
            .limit(1)
            .await
            .map_err(|source| MongoDaoError::read(QUESTION_COLLECTION, source))?
            .try_next()
            .await
            .map_err(|source| MongoDaoError::read(QUESTION_COLLECTION, source))?;

        document.map(QuestionEntity::try_from).transpose()
    }

    async fn submitted_question_ids(&self, team_id: Uuid) -> MongoResult<Vec<Uuid>> {
        let submissions: Vec<SubmissionEntity> = self
            .find_many::<MongoSubmissionDocument, SubmissionEntity>(
                SUBMISSION_COLLECTION,
                doc! {"team_id": team_id.to_string()},
            )
            .await?;

        let mut ids: Vec<Uuid> = Vec::with_capacity(submissions.len());
        for submission in submissions {
            if !ids.contains(&submission.question_id) {
                ids.push(submission.question_id);
            }
        }
        Ok(ids)
    }
}

impl ContestStore for MongoContestStore {
    fn load_contest(&self) -> BoxFuture<'static, StorageResult<ContestEntity>> {
        let store = self.clone();
        Box::pin(async move { store.load_contest().await.map_err(Into::into) })
    }

    fn save_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_contest(contest).await.map_err(Into::into) })
    }

    fn list_schools(&self) -> BoxFuture<'static, StorageResult<Vec<SchoolEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoSchoolDocument, _>(SCHOOL_COLLECTION, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn find_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SchoolEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoSchoolDocument, _>(SCHOOL_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_school(&self, school: SchoolEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = school.id;
            store
                .upsert(SCHOOL_COLLECTION, id, MongoSchoolDocument::from(school))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_school(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(SCHOOL_COLLECTION, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoTeamDocument, _>(TEAM_COLLECTION, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoTeamDocument, _>(TEAM_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = team.id;
            store
                .upsert(TEAM_COLLECTION, id, MongoTeamDocument::from(team))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_team(id).await.map_err(Into::into) })
    }

    fn adjust_team_score(
        &self,
        id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.adjust_team_score(id, delta).await.map_err(Into::into) })
    }

    fn list_members(
        &self,
        team_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = match team_id {
                Some(team_id) => doc! {"team_id": team_id.to_string()},
                None => doc! {},
            };
            store
                .find_many::<MongoMemberDocument, _>(MEMBER_COLLECTION, filter)
                .await
                .map_err(Into::into)
        })
    }

    fn find_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoMemberDocument, _>(MEMBER_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = member.id;
            store
                .upsert(MEMBER_COLLECTION, id, MongoMemberDocument::from(member))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_member(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(MEMBER_COLLECTION, id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_accounts(&self) -> BoxFuture<'static, StorageResult<Vec<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoAccountDocument, _>(ACCOUNT_COLLECTION, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn find_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoAccountDocument, _>(ACCOUNT_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_account_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<AccountEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoAccountDocument, _>(
                    ACCOUNT_COLLECTION,
                    doc! {"username": username},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn insert_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_account(account).await.map_err(Into::into) })
    }

    fn save_account(&self, account: AccountEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = account.id;
            store
                .upsert(ACCOUNT_COLLECTION, id, MongoAccountDocument::from(account))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_account(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(ACCOUNT_COLLECTION, id)
                .await
                .map_err(Into::into)
        })
    }

    fn set_session_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.set_session_token(id, token).await.map_err(Into::into) })
    }

    fn standings_page(
        &self,
        skip: u64,
        limit: u64,
    ) -> BoxFuture<'static, StorageResult<StandingsPage>> {
        let store = self.clone();
        Box::pin(async move { store.standings_page(skip, limit).await.map_err(Into::into) })
    }

    fn all_standings(&self) -> BoxFuture<'static, StorageResult<Vec<StandingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.all_standings().await.map_err(Into::into) })
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoQuestionDocument, _>(QUESTION_COLLECTION, doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoQuestionDocument, _>(QUESTION_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = question.id;
            store
                .upsert(QUESTION_COLLECTION, id, MongoQuestionDocument::from(question))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_question(id).await.map_err(Into::into) })
    }

    fn count_questions_excluding(
        &self,
        excluded: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_questions_excluding(excluded)
                .await
                .map_err(Into::into)
        })
    }

    fn question_at_excluding(
        &self,
        excluded: Vec<Uuid>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .question_at_excluding(excluded, offset)
                .await
                .map_err(Into::into)
        })
    }

    fn list_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoAnswerDocument, _>(
                    ANSWER_COLLECTION,
                    doc! {"question_id": question_id.to_string()},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one::<MongoAnswerDocument, _>(ANSWER_COLLECTION, doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = answer.id;
            store
                .upsert(ANSWER_COLLECTION, id, MongoAnswerDocument::from(answer))
                .await
                .map_err(Into::into)
        })
    }

    fn delete_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_by_id(ANSWER_COLLECTION, id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_correct_answer(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoAnswerDocument, AnswerEntity>(
                    ANSWER_COLLECTION,
                    doc! {"question_id": question_id.to_string(), "is_correct": true},
                )
                .await
                .map(|answers| answers.into_iter().next())
                .map_err(Into::into)
        })
    }

    fn insert_submission(
        &self,
        submission: SubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let document: MongoSubmissionDocument = submission.into();
            store
                .collection::<MongoSubmissionDocument>(SUBMISSION_COLLECTION)
                .await
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::write(SUBMISSION_COLLECTION, source))?;
            Ok(())
        })
    }

    fn submitted_question_ids(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .submitted_question_ids(team_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_submissions(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubmissionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_many::<MongoSubmissionDocument, _>(
                    SUBMISSION_COLLECTION,
                    doc! {"team_id": team_id.to_string()},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::Role;

    #[test]
    fn standings_pipeline_only_ranks_linked_participants() {
        let pipeline = MongoContestStore::standings_pipeline();
        let matcher = pipeline[0].get_document("$match").unwrap();
        assert_eq!(matcher.get_str("role").unwrap(), "USER");

        let sort = pipeline[3].get_document("$sort").unwrap();
        let keys: Vec<_> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, ["team.score", "created_at", "_id"]);
        assert_eq!(sort.get_i32("team.score").unwrap(), -1);
    }

    #[test]
    fn role_filter_matches_serialized_role() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "USER");
    }
}
