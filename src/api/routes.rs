use crate::api::handlers::{accounts, health, transfers, users};
use crate::auth::middleware::auth_middleware;
use crate::AppState;
use axum::{
    middleware,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
        }
    }
}

/// Handler a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CreateUser,
    LoginUser,
    CreateAccount,
    GetAccount,
    ListAccounts,
    CreateTransfer,
    Health,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub method: HttpMethod,
    pub path: &'static str,
    pub requires_auth: bool,
    pub endpoint: Endpoint,
}

const fn route(
    method: HttpMethod,
    path: &'static str,
    requires_auth: bool,
    endpoint: Endpoint,
) -> RouteSpec {
    RouteSpec {
        method,
        path,
        requires_auth,
        endpoint,
    }
}

/// Every route the server exposes. Protected routes sit behind the auth
/// middleware; the rest are reachable anonymously.
pub const ROUTES: &[RouteSpec] = &[
    route(HttpMethod::Post, "/users", false, Endpoint::CreateUser),
    route(HttpMethod::Post, "/users/login", false, Endpoint::LoginUser),
    route(HttpMethod::Post, "/accounts", true, Endpoint::CreateAccount),
    route(HttpMethod::Get, "/accounts/{id}", true, Endpoint::GetAccount),
    route(HttpMethod::Get, "/accounts", true, Endpoint::ListAccounts),
    route(HttpMethod::Post, "/transfers", true, Endpoint::CreateTransfer),
    route(HttpMethod::Get, "/health", false, Endpoint::Health),
];

fn method_router(entry: &RouteSpec) -> MethodRouter<AppState> {
    let filter = entry.method.filter();
    match entry.endpoint {
        Endpoint::CreateUser => on(filter, users::create_user),
        Endpoint::LoginUser => on(filter, users::login_user),
        Endpoint::CreateAccount => on(filter, accounts::create_account),
        Endpoint::GetAccount => on(filter, accounts::get_account),
        Endpoint::ListAccounts => on(filter, accounts::list_accounts),
        Endpoint::CreateTransfer => on(filter, transfers::create_transfer),
        Endpoint::Health => on(filter, health),
    }
}

pub fn create_router(state: AppState) -> Router {
    let (public_routes, protected_routes) = ROUTES.iter().fold(
        (Router::new(), Router::new()),
        |(public, protected), entry| {
            if entry.requires_auth {
                (public, protected.route(entry.path, method_router(entry)))
            } else {
                (public.route(entry.path, method_router(entry)), protected)
            }
        },
    );

    let token_maker = state.token_maker.clone();
    let protected_routes = protected_routes.route_layer(middleware::from_fn(move |req, next| {
        auth_middleware(token_maker.clone(), req, next)
    }));

    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
