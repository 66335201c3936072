/// Admin CRUD over schools, teams, members, questions, answers and accounts.
pub mod admin_service;
/// Credential login, session checks and the bootstrap account.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Random unsolved-question draw.
pub mod draw_service;
/// Health check service.
pub mod health_service;
/// Live and frozen leaderboard pages.
pub mod leaderboard_service;
/// Contest lifecycle actions.
pub mod lifecycle_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Answer submission recorder.
pub mod submission_service;
