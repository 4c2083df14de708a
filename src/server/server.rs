use anyhow::Result;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tracing::{debug, error};

use crate::error::{ApiOutcome, DomainError};
use crate::events::{EventStore, NewEvent};
use crate::mailer::Mailer;
use crate::media::MediaStore;
use crate::profile::{CollaboratorProfile, InfluencerFilter, InfluencerProfile, ProfileStore};
use crate::user::{AuthTokenValue, AuthenticatedUser, Role, UserManager, UserStore};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::NaiveDate;
use tower_http::services::ServeDir;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    log_requests,
    session::{AdminSession, CollaboratorSession, InfluencerSession, Session},
    state::*,
    RequestsLoggingLevel, ServerConfig,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct SignupBody {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct ChangePasswordBody {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Debug)]
struct UserStatusBody {
    pub enabled: bool,
}

#[derive(Deserialize, Debug)]
struct ContactInfluencerBody {
    pub influencer_email: String,
    pub message: String,
}

#[derive(Deserialize, Debug)]
struct CitiesQuery {
    pub field: Option<String>,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Serialize)]
struct AdminUserView {
    pub email: String,
    pub role: Role,
    pub enabled: bool,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn signup(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<SignupBody>,
) -> Response {
    let role = match Role::from_str(&body.role) {
        Some(role) => role,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiOutcome::fail("Unknown role.")),
            )
                .into_response()
        }
    };
    // Admin accounts are provisioned, never self-registered.
    if role == Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiOutcome::fail("This role cannot be registered.")),
        )
            .into_response();
    }

    match user_manager
        .lock()
        .unwrap()
        .register(&body.email, &body.password, role)
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ApiOutcome::ok("Account created.")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

fn respond_with_fresh_session(user_manager: &UserManager, user: &AuthenticatedUser) -> Response {
    match user_manager.issue_auth_token(&user.email) {
        Ok(auth_token) => {
            let response_body = LoginSuccessResponse {
                token: auth_token.value.0.clone(),
            };
            let response_body = serde_json::to_string(&response_body).unwrap();

            let cookie_value = HeaderValue::from_str(&format!(
                "session_token={}; Path=/; HttpOnly",
                auth_token.value.0.clone()
            ))
            .unwrap();
            response::Builder::new()
                .status(StatusCode::CREATED)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::SET_COOKIE, cookie_value)
                .body(Body::from(response_body))
                .unwrap()
        }
        Err(err) => {
            error!("Error with auth token generation: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.email);
    let locked_manager = user_manager.lock().unwrap();
    match locked_manager.authenticate(&body.email, &body.password) {
        Ok(user) => respond_with_fresh_session(&locked_manager, &user),
        Err(err) => err.into_response(),
    }
}

async fn admin_login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("admin_login() called for {}", body.email);
    let locked_manager = user_manager.lock().unwrap();
    match locked_manager.admin_authenticate(&body.email, &body.password) {
        Ok(user) => respond_with_fresh_session(&locked_manager, &user),
        Err(err) => err.into_response(),
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager
        .lock()
        .unwrap()
        .revoke_auth_token(&AuthTokenValue(session.token))
    {
        Ok(()) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::SET_COOKIE, cookie_value.to_string())
                .body(Body::from(
                    serde_json::to_string(&ApiOutcome::ok("Logged out.")).unwrap(),
                ))
                .unwrap()
        }
        Err(err) => err.into_response(),
    }
}

async fn get_session(session: Session) -> Response {
    Json(AuthenticatedUser {
        email: session.email,
        role: session.role,
    })
    .into_response()
}

async fn put_password(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<ChangePasswordBody>,
) -> Response {
    match user_manager.lock().unwrap().change_password(
        &session.email,
        &body.old_password,
        &body.new_password,
    ) {
        Ok(()) => Json(ApiOutcome::ok("Password changed.")).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Multipart profile submission, text fields plus an optional `photo` part.
struct ProfileForm {
    fields: HashMap<String, String>,
    photo: Option<Vec<u8>>,
}

impl ProfileForm {
    async fn read(mut multipart: Multipart) -> Result<Self, DomainError> {
        let mut fields = HashMap::new();
        let mut photo = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| DomainError::Upload)?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            if name == "photo" {
                let bytes = field.bytes().await.map_err(|_| DomainError::Upload)?;
                if !bytes.is_empty() {
                    photo = Some(bytes.to_vec());
                }
            } else {
                let value = field.text().await.map_err(|_| DomainError::Upload)?;
                fields.insert(name, value);
            }
        }
        Ok(ProfileForm { fields, photo })
    }

    fn text(&self, key: &str) -> String {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    /// Empty or malformed dates are stored as absent.
    fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.text("birth_date").trim(), "%Y-%m-%d").ok()
    }

    /// A fresh upload wins over an echoed-back reference.
    fn resolve_media(
        &self,
        media_store: &GuardedMediaStore,
        folder: &str,
    ) -> Result<String, DomainError> {
        match &self.photo {
            Some(bytes) => Ok(media_store.store(bytes, folder)?.as_string()),
            None => Ok(self.text("media_ref")),
        }
    }
}

async fn post_influencer_profile(
    session: InfluencerSession,
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Response {
    let form = match ProfileForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };
    let media_ref = match form.resolve_media(&state.media_store, "influencers") {
        Ok(media_ref) => media_ref,
        Err(err) => return err.into_response(),
    };

    let profile = InfluencerProfile {
        email: session.0.email,
        display_name: form.text("display_name"),
        gender: form.text("gender"),
        birth_date: form.birth_date(),
        address: form.text("address"),
        city: form.text("city"),
        contact_number: form.text("contact_number"),
        field: form.text("field"),
        instagram: form.text("instagram"),
        youtube: form.text("youtube"),
        other_social: form.text("other_social"),
        media_ref,
    };

    match state.profile_store.upsert_influencer(&profile) {
        Ok(()) => Json(ApiOutcome::ok("Profile saved.")).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn post_collaborator_profile(
    session: CollaboratorSession,
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Response {
    let form = match ProfileForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };
    let media_ref = match form.resolve_media(&state.media_store, "collaborators") {
        Ok(media_ref) => media_ref,
        Err(err) => return err.into_response(),
    };

    let profile = CollaboratorProfile {
        email: session.0.email,
        display_name: form.text("display_name"),
        gender: form.text("gender"),
        birth_date: form.birth_date(),
        address: form.text("address"),
        city: form.text("city"),
        contact_number: form.text("contact_number"),
        instagram: form.text("instagram"),
        media_ref,
    };

    match state.profile_store.upsert_collaborator(&profile) {
        Ok(()) => Json(ApiOutcome::ok("Profile saved.")).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn get_profile(
    _session: Session,
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> Response {
    let account = match state.user_manager.lock().unwrap().get_account(&email) {
        Ok(Some(account)) => account,
        Ok(None) => return DomainError::NotFound.into_response(),
        Err(err) => return err.into_response(),
    };

    match account.role {
        Role::Influencer => match state.profile_store.get_influencer(&email) {
            Ok(profile) => Json(profile).into_response(),
            Err(err) => DomainError::Persistence(err.to_string()).into_response(),
        },
        Role::Collaborator => match state.profile_store.get_collaborator(&email) {
            Ok(profile) => Json(profile).into_response(),
            Err(err) => DomainError::Persistence(err.to_string()).into_response(),
        },
        Role::Admin => DomainError::NotFound.into_response(),
    }
}

async fn post_event(
    session: InfluencerSession,
    State(event_store): State<GuardedEventStore>,
    Json(body): Json<NewEvent>,
) -> Response {
    match event_store.create(&session.0.email, &body) {
        Ok(id) => {
            let event = crate::events::Event {
                id,
                owner_email: session.0.email,
                name: body.name,
                date: body.date,
                time: body.time,
                city: body.city,
                venue: body.venue,
            };
            (StatusCode::CREATED, Json(event)).into_response()
        }
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn get_events(
    session: InfluencerSession,
    State(event_store): State<GuardedEventStore>,
) -> Response {
    match event_store.list_for_owner(&session.0.email) {
        Ok(events) => Json(events).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn delete_event(
    session: InfluencerSession,
    State(event_store): State<GuardedEventStore>,
    Path(id): Path<i64>,
) -> Response {
    match event_store.delete(id, &session.0.email) {
        Ok(true) => Json(ApiOutcome::ok("Event deleted.")).into_response(),
        Ok(false) => DomainError::NotFound.into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn get_admin_users(
    _session: AdminSession,
    State(user_manager): State<GuardedUserManager>,
) -> Response {
    match user_manager.lock().unwrap().list_users() {
        Ok(accounts) => {
            let views: Vec<AdminUserView> = accounts
                .into_iter()
                .map(|account| AdminUserView {
                    email: account.email,
                    role: account.role,
                    enabled: account.enabled,
                })
                .collect();
            Json(views).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn delete_admin_user(
    session: AdminSession,
    State(state): State<ServerState>,
    Path(email): Path<String>,
) -> Response {
    if let Err(err) = state
        .user_manager
        .lock()
        .unwrap()
        .delete_user(&email, &session.0.email)
    {
        return err.into_response();
    }
    // The account is gone, now drop everything hanging off it.
    if let Err(err) = state.profile_store.delete_for_email(&email) {
        return DomainError::Persistence(err.to_string()).into_response();
    }
    if let Err(err) = state.event_store.delete_for_owner(&email) {
        return DomainError::Persistence(err.to_string()).into_response();
    }
    Json(ApiOutcome::ok("User deleted.")).into_response()
}

async fn put_admin_user_status(
    session: AdminSession,
    State(user_manager): State<GuardedUserManager>,
    Path(email): Path<String>,
    Json(body): Json<UserStatusBody>,
) -> Response {
    match user_manager
        .lock()
        .unwrap()
        .set_enabled(&email, body.enabled, &session.0.email)
    {
        Ok(()) => {
            let message = if body.enabled {
                "User unblocked."
            } else {
                "User blocked."
            };
            Json(ApiOutcome::ok(message)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn get_admin_influencer_profiles(
    _session: AdminSession,
    State(profile_store): State<GuardedProfileStore>,
) -> Response {
    match profile_store.all_influencers() {
        Ok(profiles) => Json(profiles).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

/// An empty criterion does not constrain the search.
fn normalize_filter(filter: InfluencerFilter) -> InfluencerFilter {
    InfluencerFilter {
        field: filter.field.filter(|s| !s.is_empty()),
        city: filter.city.filter(|s| !s.is_empty()),
        name: filter.name.filter(|s| !s.is_empty()),
    }
}

async fn find_influencers(
    _session: CollaboratorSession,
    State(profile_store): State<GuardedProfileStore>,
    Query(filter): Query<InfluencerFilter>,
) -> Response {
    match profile_store.search_influencers(&normalize_filter(filter)) {
        Ok(profiles) => Json(profiles).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn find_cities(
    _session: CollaboratorSession,
    State(profile_store): State<GuardedProfileStore>,
    Query(query): Query<CitiesQuery>,
) -> Response {
    let field = query.field.unwrap_or_default();
    match profile_store.distinct_cities_for_field(&field) {
        Ok(cities) => Json(cities).into_response(),
        Err(err) => DomainError::Persistence(err.to_string()).into_response(),
    }
}

async fn contact_influencer(
    session: CollaboratorSession,
    State(state): State<ServerState>,
    Json(body): Json<ContactInfluencerBody>,
) -> Response {
    let target = match state
        .user_manager
        .lock()
        .unwrap()
        .get_account(&body.influencer_email)
    {
        Ok(Some(account)) if account.role == Role::Influencer => account,
        Ok(_) => return DomainError::NotFound.into_response(),
        Err(err) => return err.into_response(),
    };

    let subject = format!("New collaboration inquiry from {}", session.0.email);
    match state.mailer.send(&target.email, &subject, &body.message).await {
        Ok(()) => Json(ApiOutcome::ok("Message sent.")).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_media(
    _session: Session,
    State(media_store): State<GuardedMediaStore>,
    Path((folder, name)): Path<(String, String)>,
) -> Response {
    let payload = match media_store.load(&folder, &name) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };

    if let Some(kind) = infer::get(&payload) {
        if kind.mime_type().starts_with("image/") {
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, kind.mime_type().to_string())
                .body(payload.into())
                .unwrap();
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

impl ServerState {
    fn new(
        config: ServerConfig,
        user_store: Box<dyn UserStore>,
        profile_store: Arc<dyn ProfileStore>,
        event_store: Arc<dyn EventStore>,
        media_store: Arc<dyn MediaStore>,
        mailer: Arc<dyn Mailer>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(Mutex::new(UserManager::new(user_store))),
            profile_store,
            event_store,
            media_store,
            mailer,
            hash: "123456".to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    user_store: Box<dyn UserStore>,
    profile_store: Arc<dyn ProfileStore>,
    event_store: Arc<dyn EventStore>,
    media_store: Arc<dyn MediaStore>,
    mailer: Arc<dyn Mailer>,
) -> Result<Router> {
    let state = ServerState::new(
        config.clone(),
        user_store,
        profile_store,
        event_store,
        media_store,
        mailer,
    );

    let auth_routes: Router = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/admin-login", post(admin_login))
        .route("/logout", get(logout))
        .route("/session", get(get_session))
        .route("/password", put(put_password))
        .with_state(state.clone());

    let profile_routes: Router = Router::new()
        .route("/influencer", post(post_influencer_profile))
        .route("/collaborator", post(post_collaborator_profile))
        .route("/{email}", get(get_profile))
        .with_state(state.clone());

    let event_routes: Router = Router::new()
        .route("/", post(post_event))
        .route("/", get(get_events))
        .route("/{id}", delete(delete_event))
        .with_state(state.clone());

    let admin_routes: Router = Router::new()
        .route("/users", get(get_admin_users))
        .route("/users/{email}", delete(delete_admin_user))
        .route("/users/{email}/status", put(put_admin_user_status))
        .route("/influencer-profiles", get(get_admin_influencer_profiles))
        .with_state(state.clone());

    let find_routes: Router = Router::new()
        .route("/influencers", get(find_influencers))
        .route("/cities", get(find_cities))
        .route("/contact", post(contact_influencer))
        .with_state(state.clone());

    let media_routes: Router = Router::new()
        .route("/{folder}/{name}", get(get_media))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/profile", profile_routes)
        .nest("/v1/events", event_routes)
        .nest("/v1/admin", admin_routes)
        .nest("/v1/find", find_routes)
        .nest("/v1/media", media_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    user_store: Box<dyn UserStore>,
    profile_store: Arc<dyn ProfileStore>,
    event_store: Arc<dyn EventStore>,
    media_store: Arc<dyn MediaStore>,
    mailer: Arc<dyn Mailer>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
    session_ttl_days: u64,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
        session_ttl_days,
    };
    let app = make_app(
        config,
        user_store,
        profile_store,
        event_store,
        media_store,
        mailer,
    )?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SqliteEventStore;
    use crate::mailer::LogMailer;
    use crate::media::LocalMediaStore;
    use crate::profile::SqliteProfileStore;
    use crate::user::SqliteUserStore;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(dir: &TempDir) -> Router {
        let user_store = Box::new(SqliteUserStore::new(dir.path().join("user.db")).unwrap());
        let conn = crate::marketplace_db::open(dir.path().join("marketplace.db")).unwrap();
        let profile_store = Arc::new(SqliteProfileStore::new(conn.clone()));
        let event_store = Arc::new(SqliteEventStore::new(conn));
        let media_store = Arc::new(LocalMediaStore::new(dir.path().join("media")));
        make_app(
            ServerConfig::default(),
            user_store,
            profile_store,
            event_store,
            media_store,
            Arc::new(LogMailer),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let protected_routes = vec![
            "/v1/auth/logout",
            "/v1/auth/session",
            "/v1/profile/somebody@x.com",
            "/v1/events",
            "/v1/admin/users",
            "/v1/admin/influencer-profiles",
            "/v1/find/influencers",
            "/v1/find/cities",
            "/v1/media/photos/abc.png",
        ];

        for route in protected_routes.into_iter() {
            println!("Trying route {}", route);
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn home_reports_stats_without_session() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3661)),
            "1d 01:01:01"
        );
    }
}
