use tracing::debug;

use crate::{
    dao::models::{ContestStatus, StandingEntity},
    dto::leaderboard::{LeaderboardMeta, LeaderboardQuery, LeaderboardResponse},
    error::ServiceError,
    state::SharedState,
};

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    page: u64,
    limit: u64,
}

impl Window {
    fn skip(self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn window(state: &SharedState, query: &LeaderboardQuery) -> Result<Window, ServiceError> {
    let config = state.config();
    let page = query.page.unwrap_or(1);
    let limit = query
        .limit
        .unwrap_or_else(|| i64::from(config.leaderboard_default_limit));

    if page < 1 || limit < 1 {
        return Err(ServiceError::InvalidInput(
            "page and limit must be positive integers".into(),
        ));
    }

    Ok(Window {
        page: page.unsigned_abs(),
        limit: limit.unsigned_abs(),
    })
}

/// One page of standings: the frozen snapshot while the contest is frozen,
/// live standings otherwise.
pub async fn get_leaderboard(
    state: &SharedState,
    query: LeaderboardQuery,
) -> Result<LeaderboardResponse, ServiceError> {
    let window = window(state, &query)?;
    let store = state.require_store().await?;
    let contest = store.load_contest().await?;

    let (rows, total, is_frozen) = match contest.frozen_leaderboard {
        Some(snapshot) if contest.status == ContestStatus::Frozen => {
            let total = snapshot.len() as u64;
            (slice_snapshot(snapshot, window), total, true)
        }
        _ => {
            let page = store.standings_page(window.skip(), window.limit).await?;
            (page.rows, page.total, false)
        }
    };

    debug!(
        page = window.page,
        limit = window.limit,
        total,
        is_frozen,
        "leaderboard page served"
    );

    Ok(LeaderboardResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: LeaderboardMeta {
            total_users: total,
            page: window.page,
            limit: window.limit,
            total_pages: total.div_ceil(window.limit),
            is_frozen,
        },
    })
}

fn slice_snapshot(snapshot: Vec<StandingEntity>, window: Window) -> Vec<StandingEntity> {
    let skip = usize::try_from(window.skip()).unwrap_or(usize::MAX);
    let take = usize::try_from(window.limit).unwrap_or(usize::MAX);
    snapshot.into_iter().skip(skip).take(take).collect()
}
