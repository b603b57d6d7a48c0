//! A stand-in for the REST API that serves fixture data.
//!
//! It is used by the console for demos and by the HTTP tests.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use time::macros::datetime;
use tower_http::trace::TraceLayer;

use crate::{
    endpoints,
    entity::EntityId,
    logging::logging_middleware,
    models::{
        AccessToken, AuthUser, Category, Credentials, Pincode, ServiceProvider, SignUp,
        Subcategory, UpstreamCompany, UpstreamUser,
    },
};

const TOKEN_PREFIX: &str = "mock-token-";

/// An account that can log in to the mock API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAccount {
    /// The profile returned for the account.
    pub user: AuthUser,
    /// The plain text password.
    pub password: String,
}

/// The data served by the mock API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockApi {
    /// Served by `GET /users` in the upstream shape.
    pub users: Vec<UpstreamUser>,
    /// Served by `GET /pincodes`.
    pub pincodes: Vec<Pincode>,
    /// Served by `GET /categories`.
    pub categories: Vec<Category>,
    /// Served by `GET /subcategories`.
    pub subcategories: Vec<Subcategory>,
    /// Served by `GET /service-providers`.
    pub service_providers: Vec<ServiceProvider>,
    /// The accounts that can log in. `POST /users` adds to this list.
    pub accounts: Vec<MockAccount>,
}

impl MockApi {
    /// The fixture data set.
    ///
    /// The account `john@mail.com` with the password `changeme` can log in.
    pub fn with_fixtures() -> Self {
        Self {
            users: vec![
                upstream_user(
                    1,
                    "Leanne Graham",
                    "Bret",
                    "Sincere@april.biz",
                    "hildegard.org",
                    ("Romaguera-Crona", "Multi-layered client-server neural-net", "harness real-time e-markets"),
                ),
                upstream_user(
                    2,
                    "Ervin Howell",
                    "Antonette",
                    "Shanna@melissa.tv",
                    "anastasia.net",
                    ("Deckow-Crist", "Proactive didactic contingency", "synergize scalable supply-chains"),
                ),
                upstream_user(
                    3,
                    "Clementine Bauch",
                    "Samantha",
                    "Nathan@yesenia.net",
                    "ramiro.info",
                    ("Romaguera-Jacobson", "Face to face bifurcated interface", "e-enable strategic applications"),
                ),
            ],
            pincodes: vec![
                pincode(1, "Andheri East", "400069", "Mumbai Suburban", "Andheri", "Maharashtra", "Mumbai"),
                pincode(2, "Connaught Place", "110001", "New Delhi", "New Delhi", "Delhi", "New Delhi"),
                pincode(3, "Koramangala", "560034", "Bangalore", "Bangalore South", "Karnataka", "Bengaluru"),
                pincode(4, "T Nagar", "600017", "Chennai", "Mambalam", "Tamil Nadu", "Chennai"),
            ],
            categories: vec![
                Category {
                    id: Some(EntityId::Int(1)),
                    name: "Plumbing".to_owned(),
                    icon: "wrench".to_owned(),
                    image_url: "https://images.example.com/plumbing.png".to_owned(),
                    comments: "Pipes, taps and drains".to_owned(),
                    created_at: Some(datetime!(2024-01-15 10:30:00 UTC)),
                    modified_at: Some(datetime!(2024-01-15 10:30:00 UTC)),
                },
                Category {
                    id: Some(EntityId::Int(2)),
                    name: "Electrical".to_owned(),
                    icon: "bolt".to_owned(),
                    image_url: "https://images.example.com/electrical.png".to_owned(),
                    comments: String::new(),
                    created_at: Some(datetime!(2024-02-01 08:00:00 UTC)),
                    modified_at: Some(datetime!(2024-03-12 17:45:00 UTC)),
                },
            ],
            subcategories: vec![
                Subcategory {
                    id: Some(EntityId::Int(1)),
                    name: "Tap Repair".to_owned(),
                    icon: "droplet".to_owned(),
                    image_url: String::new(),
                    comments: String::new(),
                    created_at: Some(datetime!(2024-01-16 09:00:00 UTC)),
                    modified_at: Some(datetime!(2024-01-16 09:00:00 UTC)),
                    category_id: Some(EntityId::Int(1)),
                    category_name: "Plumbing".to_owned(),
                },
                Subcategory {
                    id: Some(EntityId::Int(2)),
                    name: "Wiring".to_owned(),
                    icon: "plug".to_owned(),
                    image_url: String::new(),
                    comments: "Includes inspections".to_owned(),
                    created_at: Some(datetime!(2024-02-02 11:15:00 UTC)),
                    modified_at: Some(datetime!(2024-02-02 11:15:00 UTC)),
                    category_id: Some(EntityId::Int(2)),
                    category_name: "Electrical".to_owned(),
                },
            ],
            service_providers: vec![
                ServiceProvider {
                    id: Some(EntityId::Int(1)),
                    country: "India".to_owned(),
                    sp_name: "Sharma Plumbing Works".to_owned(),
                    address_line1: "12 MIDC Road".to_owned(),
                    address_line2: "Andheri East".to_owned(),
                    address_line3: String::new(),
                    city: "Mumbai".to_owned(),
                    state: "Maharashtra".to_owned(),
                    postal_code: "400069".to_owned(),
                },
                ServiceProvider {
                    id: Some(EntityId::Int(2)),
                    country: "India".to_owned(),
                    sp_name: "Bright Spark Electricals".to_owned(),
                    address_line1: "80 Feet Road".to_owned(),
                    address_line2: "Koramangala 4th Block".to_owned(),
                    address_line3: String::new(),
                    city: "Bengaluru".to_owned(),
                    state: "Karnataka".to_owned(),
                    postal_code: "560034".to_owned(),
                },
            ],
            accounts: vec![MockAccount {
                user: AuthUser {
                    id: EntityId::Int(1),
                    email: "john@mail.com".to_owned(),
                    name: "Jhon".to_owned(),
                },
                password: "changeme".to_owned(),
            }],
        }
    }
}

fn upstream_user(
    id: i64,
    name: &str,
    username: &str,
    email: &str,
    website: &str,
    (company, catch_phrase, bs): (&str, &str, &str),
) -> UpstreamUser {
    UpstreamUser {
        id: EntityId::Int(id),
        name: name.to_owned(),
        username: username.to_owned(),
        email: email.to_owned(),
        website: website.to_owned(),
        company: UpstreamCompany {
            name: company.to_owned(),
            catch_phrase: catch_phrase.to_owned(),
            bs: bs.to_owned(),
        },
    }
}

fn pincode(
    id: i64,
    office_name: &str,
    code: &str,
    district_name: &str,
    taluk: &str,
    state_name: &str,
    city: &str,
) -> Pincode {
    Pincode {
        id: Some(EntityId::Int(id)),
        office_name: office_name.to_owned(),
        pincode: code.to_owned(),
        district_name: district_name.to_owned(),
        taluk: taluk.to_owned(),
        state_name: state_name.to_owned(),
        city: city.to_owned(),
    }
}

type SharedApi = Arc<Mutex<MockApi>>;

/// Return a router with all the mock API routes, the request logging
/// middleware and a tracing layer.
pub fn build_mock_router(api: MockApi) -> Router {
    let state: SharedApi = Arc::new(Mutex::new(api));

    let router = Router::new()
        .route(endpoints::USERS, get(get_users).post(create_account))
        .route(endpoints::PINCODES, get(get_pincodes))
        .route(endpoints::CATEGORIES, get(get_categories))
        .route(endpoints::SUBCATEGORIES, get(get_subcategories))
        .route(endpoints::SERVICE_PROVIDERS, get(get_service_providers))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::PROFILE, get(get_profile))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state);

    add_tracing_layer(router)
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        .on_failure(());

    router.layer(tracing_layer)
}

/// The errors the mock API responds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockApiError {
    Unauthorized,
    EmailTaken,
    Internal,
}

impl IntoResponse for MockApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            MockApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            MockApiError::EmailTaken => (StatusCode::BAD_REQUEST, "Email is already registered"),
            MockApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

fn lock(api: &SharedApi) -> Result<MutexGuard<'_, MockApi>, MockApiError> {
    api.lock().map_err(|error| {
        tracing::error!("Could not acquire the mock API lock: {error}");
        MockApiError::Internal
    })
}

async fn get_users(State(api): State<SharedApi>) -> Result<Json<Vec<UpstreamUser>>, MockApiError> {
    Ok(Json(lock(&api)?.users.clone()))
}

async fn get_pincodes(State(api): State<SharedApi>) -> Result<Json<Vec<Pincode>>, MockApiError> {
    Ok(Json(lock(&api)?.pincodes.clone()))
}

async fn get_categories(
    State(api): State<SharedApi>,
) -> Result<Json<Vec<Category>>, MockApiError> {
    Ok(Json(lock(&api)?.categories.clone()))
}

async fn get_subcategories(
    State(api): State<SharedApi>,
) -> Result<Json<Vec<Subcategory>>, MockApiError> {
    Ok(Json(lock(&api)?.subcategories.clone()))
}

async fn get_service_providers(
    State(api): State<SharedApi>,
) -> Result<Json<Vec<ServiceProvider>>, MockApiError> {
    Ok(Json(lock(&api)?.service_providers.clone()))
}

async fn log_in(
    State(api): State<SharedApi>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AccessToken>, MockApiError> {
    let api = lock(&api)?;

    let account = api
        .accounts
        .iter()
        .find(|account| {
            account.user.email.eq_ignore_ascii_case(credentials.email.trim())
                && account.password == credentials.password
        })
        .ok_or(MockApiError::Unauthorized)?;

    Ok(Json(AccessToken {
        access_token: format!("{TOKEN_PREFIX}{}", account.user.id),
    }))
}

async fn get_profile(
    State(api): State<SharedApi>,
    headers: HeaderMap,
) -> Result<Json<AuthUser>, MockApiError> {
    let user_id = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| token.strip_prefix(TOKEN_PREFIX))
        .ok_or(MockApiError::Unauthorized)?;

    lock(&api)?
        .accounts
        .iter()
        .find(|account| account.user.id.to_string() == user_id)
        .map(|account| Json(account.user.clone()))
        .ok_or(MockApiError::Unauthorized)
}

async fn create_account(
    State(api): State<SharedApi>,
    Json(sign_up): Json<SignUp>,
) -> Result<Response, MockApiError> {
    let mut api = lock(&api)?;

    if api
        .accounts
        .iter()
        .any(|account| account.user.email.eq_ignore_ascii_case(sign_up.email.trim()))
    {
        return Err(MockApiError::EmailTaken);
    }

    let id = api
        .accounts
        .iter()
        .filter_map(|account| account.user.id.as_i64())
        .max()
        .unwrap_or(0)
        + 1;

    let user = AuthUser {
        id: EntityId::Int(id),
        email: sign_up.email.trim().to_owned(),
        name: sign_up.name.clone(),
    };

    api.accounts.push(MockAccount {
        user: user.clone(),
        password: sign_up.password,
    });

    tracing::info!("Created mock account {} for {}", user.id, user.email);

    let body = json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "avatar": sign_up.avatar,
    });

    Ok((StatusCode::CREATED, Json(body)).into_response())
}
