use crate::api::ApiError;
use crate::errors::AppError;
use crate::models::{LoginForm, LoginQuery, RevenueSummary, ShellQuery, UserDetail, UserSummary};
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::ui::{
    render_login, render_shell, Banner, Formats, LoginPage, ShellPage, FIELDS_REQUIRED,
    INVALID_CREDENTIALS, LOGIN_SUCCESS, SESSION_EXPIRED,
};
use crate::views::{ConsoleViews, Gate, Panel, ShellState, Tab};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::future::Future;
use tracing::{debug, error, info, warn};

const LOGIN_ROUTE: &str = "/login";
const EXPIRED_ROUTE: &str = "/login?expired=1";
const DASHBOARD_ROUTE: &str = "/dashboard";

pub async fn index(State(state): State<AppState>) -> Redirect {
    let snapshot = state.session.snapshot().await;
    match Gate::of(&snapshot.session) {
        Gate::Authenticated => Redirect::to(DASHBOARD_ROUTE),
        Gate::Unauthenticated => Redirect::to(LOGIN_ROUTE),
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Response {
    let snapshot = state.session.snapshot().await;
    if Gate::of(&snapshot.session) == Gate::Authenticated {
        return Redirect::to(DASHBOARD_ROUTE).into_response();
    }

    let banner = query.expired.is_some().then_some(Banner::Error(SESSION_EXPIRED));
    Html(render_login(&LoginPage { email: "", banner })).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        let page = LoginPage {
            email,
            banner: Some(Banner::Error(FIELDS_REQUIRED)),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(render_login(&page))).into_response());
    }

    match state.api.login(email, &form.password).await {
        Ok(response) => {
            state.session.login(response.token, response.user_name).await?;
            state.views.lock().await.reset();
            info!("login accepted for {email}");

            let page = LoginPage {
                email,
                banner: Some(Banner::Success(LOGIN_SUCCESS)),
            };
            Ok(Html(render_login(&page)).into_response())
        }
        Err(err) => {
            warn!("login rejected for {email}: {err}");
            let page = LoginPage {
                email,
                banner: Some(Banner::Error(INVALID_CREDENTIALS)),
            };
            Ok((StatusCode::UNAUTHORIZED, Html(render_login(&page))).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let result = state.session.logout().await;
    state.views.lock().await.reset();
    result?;
    Ok(Redirect::to(LOGIN_ROUTE))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<ShellQuery>,
) -> Result<Response, AppError> {
    let snapshot = state.session.snapshot().await;
    let Some(token) = snapshot.token() else {
        return Ok(Redirect::to(LOGIN_ROUTE).into_response());
    };
    let shell = ShellState::from_query(&query);

    let fetched = match shell.active_tab {
        Tab::Dashboard => {
            fetch_panel(&state, &snapshot, false, "revenue summary", revenue_panel, || {
                state.api.revenue_summary(token)
            })
            .await?
        }
        Tab::Users => {
            state.views.lock().await.users.dismiss();
            // every visit to the tab reloads the roster, except the redirect after a refresh
            let mount = query.ack.is_none();
            fetch_panel(&state, &snapshot, mount, "users", roster_panel, || {
                state.api.users(token)
            })
            .await?
        }
    };
    if fetched == Fetched::Expired {
        return Ok(Redirect::to(EXPIRED_ROUTE).into_response());
    }

    Ok(render(&state, &snapshot, shell, query.ack.is_some()).await)
}

pub async fn refresh_revenue(
    State(state): State<AppState>,
    Query(query): Query<ShellQuery>,
) -> Result<Redirect, AppError> {
    let snapshot = state.session.snapshot().await;
    let Some(token) = snapshot.token() else {
        return Ok(Redirect::to(LOGIN_ROUTE));
    };
    let shell = ShellState::from_query(&query).with_tab(Tab::Dashboard);

    let fetched = fetch_panel(&state, &snapshot, true, "revenue summary", revenue_panel, || {
        state.api.revenue_summary(token)
    })
    .await?;

    Ok(match fetched {
        Fetched::Expired => Redirect::to(EXPIRED_ROUTE),
        Fetched::Applied { .. } => Redirect::to(&acknowledged(shell)),
        Fetched::Failed | Fetched::Skipped => Redirect::to(&shell.href()),
    })
}

pub async fn refresh_users(
    State(state): State<AppState>,
    Query(query): Query<ShellQuery>,
) -> Result<Redirect, AppError> {
    let snapshot = state.session.snapshot().await;
    let Some(token) = snapshot.token() else {
        return Ok(Redirect::to(LOGIN_ROUTE));
    };
    let shell = ShellState::from_query(&query).with_tab(Tab::Users);

    let fetched = fetch_panel(&state, &snapshot, true, "users", roster_panel, || {
        state.api.users(token)
    })
    .await?;

    Ok(match fetched {
        Fetched::Expired => Redirect::to(EXPIRED_ROUTE),
        Fetched::Applied { first: false } => Redirect::to(&acknowledged(shell)),
        _ => Redirect::to(&shell.href()),
    })
}

pub async fn user_detail(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ShellQuery>,
) -> Result<Response, AppError> {
    let snapshot = state.session.snapshot().await;
    let Some(token) = snapshot.token() else {
        return Ok(Redirect::to(LOGIN_ROUTE).into_response());
    };
    let shell = ShellState::from_query(&query).with_tab(Tab::Users);

    // the list under the overlay
    let roster = fetch_panel(&state, &snapshot, false, "users", roster_panel, || {
        state.api.users(token)
    })
    .await?;
    if roster == Fetched::Expired {
        return Ok(Redirect::to(EXPIRED_ROUTE).into_response());
    }

    state.views.lock().await.users.dismiss();
    let detail = fetch_panel(&state, &snapshot, true, "user details", detail_panel, || {
        state.api.user_detail(token, &user_id)
    })
    .await?;
    if detail == Fetched::Expired {
        return Ok(Redirect::to(EXPIRED_ROUTE).into_response());
    }

    Ok(render(&state, &snapshot, shell, false).await)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetched {
    Applied { first: bool },
    Failed,
    /// Nothing to do, already busy, or the response arrived too late.
    Skipped,
    /// The remote service rejected the token and the session was dropped.
    Expired,
}

fn revenue_panel(views: &mut ConsoleViews) -> &mut Panel<RevenueSummary> {
    &mut views.revenue
}

fn roster_panel(views: &mut ConsoleViews) -> &mut Panel<Vec<UserSummary>> {
    &mut views.users.roster
}

fn detail_panel(views: &mut ConsoleViews) -> &mut Panel<UserDetail> {
    &mut views.users.detail
}

/// Runs one request for a panel without holding the view lock across it.
async fn fetch_panel<T, F, Fut>(
    state: &AppState,
    session: &SessionSnapshot,
    force: bool,
    label: &str,
    select: fn(&mut ConsoleViews) -> &mut Panel<T>,
    request: F,
) -> Result<Fetched, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let (ticket, first) = {
        let mut views = state.views.lock().await;
        let panel = select(&mut views);
        if !force && !panel.needs_fetch(session.epoch) {
            return Ok(Fetched::Skipped);
        }
        let first = !panel.has_responded();
        match panel.begin(session.epoch) {
            Some(ticket) => (ticket, first),
            None => {
                debug!("{label} request already in flight");
                return Ok(Fetched::Skipped);
            }
        }
    };

    let result = request().await;

    if let Err(err) = &result {
        error!("failed to fetch {label}: {err}");
        if err.is_unauthorized() && state.config.logout_on_unauthorized {
            return if expire_session(state, session.epoch).await? {
                Ok(Fetched::Expired)
            } else {
                Ok(Fetched::Skipped)
            };
        }
    }

    let mut views = state.views.lock().await;
    let panel = select(&mut views);
    let landed = match result {
        Ok(value) => panel.apply(ticket, value).then_some(Fetched::Applied { first }),
        Err(_) => panel
            .fail(ticket, format!("Could not load {label}. Try refreshing."))
            .then_some(Fetched::Failed),
    };

    Ok(landed.unwrap_or_else(|| {
        debug!("discarding late {label} response");
        Fetched::Skipped
    }))
}

/// Ends the session the rejected token belonged to. A newer session is left alone.
async fn expire_session(state: &AppState, epoch: u64) -> Result<bool, AppError> {
    if state.session.snapshot().await.epoch != epoch {
        debug!("ignoring rejection for a session that already ended");
        return Ok(false);
    }
    warn!("remote service rejected the admin token, ending session");
    let result = state.session.logout().await;
    state.views.lock().await.reset();
    result.map(|()| true)
}

async fn render(
    state: &AppState,
    snapshot: &SessionSnapshot,
    shell: ShellState,
    ack: bool,
) -> Response {
    let views = state.views.lock().await;
    let page = ShellPage {
        shell,
        display_name: snapshot.display_name(),
        views: &views,
        ack,
    };
    Html(render_shell(&page, &Formats::from_config(&state.config))).into_response()
}

fn acknowledged(shell: ShellState) -> String {
    format!("{}&ack=1", shell.href())
}
