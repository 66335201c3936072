use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the contest backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::contest_stream,
        crate::routes::public::contest_status,
        crate::routes::public::leaderboard,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::participant::draw,
        crate::routes::participant::question,
        crate::routes::participant::submit,
        crate::routes::admin::get_contest,
        crate::routes::admin::start_contest,
        crate::routes::admin::pause_contest,
        crate::routes::admin::resume_contest,
        crate::routes::admin::freeze_contest,
        crate::routes::admin::unfreeze_contest,
        crate::routes::admin::end_contest,
        crate::routes::admin::list_schools,
        crate::routes::admin::get_school,
        crate::routes::admin::create_school,
        crate::routes::admin::update_school,
        crate::routes::admin::delete_school,
        crate::routes::admin::list_teams,
        crate::routes::admin::get_team,
        crate::routes::admin::create_team,
        crate::routes::admin::update_team,
        crate::routes::admin::delete_team,
        crate::routes::admin::adjust_score,
        crate::routes::admin::team_qr,
        crate::routes::admin::list_members,
        crate::routes::admin::create_member,
        crate::routes::admin::update_member,
        crate::routes::admin::delete_member,
        crate::routes::admin::list_questions,
        crate::routes::admin::get_question,
        crate::routes::admin::create_question,
        crate::routes::admin::update_question,
        crate::routes::admin::delete_question,
        crate::routes::admin::create_answer,
        crate::routes::admin::update_answer,
        crate::routes::admin::delete_answer,
        crate::routes::admin::list_accounts,
        crate::routes::admin::get_account,
        crate::routes::admin::create_account,
        crate::routes::admin::update_account,
        crate::routes::admin::delete_account,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::StatusUpdateEvent,
            crate::dao::models::ContestStatus,
            crate::dao::models::Role,
            crate::dao::models::Difficulty,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Contest clock and leaderboard"),
        (name = "auth", description = "Login and sessions"),
        (name = "participant", description = "QR draw, questions and submissions"),
        (name = "admin", description = "Contest control and data management"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme referenced as `jwt` by secured routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_contest_routes_and_security() {
        let doc = ApiDoc::openapi();
        for path in [
            "/contest/status",
            "/leaderboard",
            "/draw",
            "/submissions",
            "/admin/contest/freeze",
            "/admin/teams/{id}/qr",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("jwt"));
    }
}
