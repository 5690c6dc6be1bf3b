use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::{Datelike, Local, NaiveDate};
use itertools::Itertools;
use miette::IntoDiagnostic;
use serde::Deserialize;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use crate::article::Article;
use crate::calendar::{self, DateWindow, Nav, ViewMode};
use crate::error::DiaryError;
use crate::{session, store, ServerConfig};

#[derive(Clone)]
pub(crate) struct DiaryState {
    pub(crate) pool: SqlitePool,
    pub(crate) config: ServerConfig,
}

#[derive(Deserialize)]
struct ShowParams {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

#[derive(Deserialize)]
struct SearchParams {
    keyword: Option<String>,
}

#[derive(Deserialize)]
struct UpdateForm {
    csrf_token: String,
    year: i32,
    month: u32,
    day: u32,
    message: String,
}

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: String,
    password: String,
}

/// Entries of one calendar month, rendered under a shared heading.
struct MonthSection {
    href: String,
    label: String,
    articles: Vec<Article>,
}

#[derive(Template, WebTemplate)]
#[template(path = "show.html")]
struct ShowPage {
    config: ServerConfig,
    notice: Option<String>,
    logged_in: bool,
    csrf_token: String,
    keyword: String,
    nav: Option<Nav>,
    sections: Vec<MonthSection>,
    limited: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "edit.html")]
struct EditPage {
    config: ServerConfig,
    notice: Option<String>,
    csrf_token: String,
    article: Article,
}

#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
struct NotFoundPage {
    config: ServerConfig,
    notice: Option<String>,
}

fn month_sections(articles: Vec<Article>) -> Vec<MonthSection> {
    let mut sections = Vec::new();
    for ((year, month), group) in &articles
        .into_iter()
        .chunk_by(|article| (article.year, article.month))
    {
        let mode = ViewMode::Month(year, month);
        sections.push(MonthSection {
            href: mode.href(),
            label: mode.label(),
            articles: group.collect(),
        });
    }
    sections
}

async fn show(
    State(state): State<DiaryState>,
    session: Session,
    Query(params): Query<ShowParams>,
) -> Result<Response, DiaryError> {
    let today = Local::now().date_naive();
    let mode = ViewMode::resolve(params.year, params.month, params.day, today);
    let window = DateWindow::new(
        store::first_entry_date(&state.pool).await.into_diagnostic()?,
        today,
    );

    let articles = match mode {
        Some(ViewMode::Month(year, month)) => {
            let stored = store::month_articles(&state.pool, year, month)
                .await
                .into_diagnostic()?;
            calendar::interpolate(stored, year, month, &window)
        }
        Some(ViewMode::Year(year)) => {
            let mut by_month: BTreeMap<u32, Vec<Article>> = BTreeMap::new();
            for article in store::year_articles(&state.pool, year)
                .await
                .into_diagnostic()?
            {
                by_month.entry(article.month).or_default().push(article);
            }
            let mut articles = Vec::new();
            for month in 1..=12 {
                let stored = by_month.remove(&month).unwrap_or_default();
                articles.extend(calendar::interpolate(stored, year, month, &window));
            }
            articles
        }
        Some(ViewMode::Day(date)) => {
            let mut articles: Vec<Article> = store::day_article(&state.pool, date)
                .await
                .into_diagnostic()?
                .into_iter()
                .collect();
            if articles.is_empty() && window.contains(date) {
                articles.push(Article::blank(date.year(), date.month(), date.day()));
            }
            articles
        }
        None => Vec::new(),
    };

    Ok(ShowPage {
        notice: session::take_notice(&session).await.into_diagnostic()?,
        logged_in: session::is_logged_in(&session).await.into_diagnostic()?,
        csrf_token: session::issue_csrf_token(&session).await.into_diagnostic()?,
        keyword: String::new(),
        nav: mode.map(|mode| calendar::nav(&mode, &window)),
        sections: month_sections(articles),
        limited: false,
        config: state.config,
    }
    .into_response())
}

async fn search(
    State(state): State<DiaryState>,
    session: Session,
    Query(params): Query<SearchParams>,
) -> Result<Response, DiaryError> {
    let keyword = params.keyword.unwrap_or_default();
    let (articles, limited) = store::search(&state.pool, &keyword)
        .await
        .into_diagnostic()?;

    Ok(ShowPage {
        notice: session::take_notice(&session).await.into_diagnostic()?,
        logged_in: session::is_logged_in(&session).await.into_diagnostic()?,
        csrf_token: session::issue_csrf_token(&session).await.into_diagnostic()?,
        keyword,
        nav: None,
        sections: month_sections(articles),
        limited,
        config: state.config,
    }
    .into_response())
}

async fn edit(
    State(state): State<DiaryState>,
    session: Session,
    Query(params): Query<ShowParams>,
) -> Result<Response, DiaryError> {
    if !session::is_logged_in(&session).await.into_diagnostic()? {
        return Ok(Redirect::to("/").into_response());
    }

    let today = Local::now().date_naive();
    let year = params.year.unwrap_or_else(|| today.year());
    let month = params.month.unwrap_or_else(|| today.month());
    let day = params.day.unwrap_or_else(|| today.day());
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return Ok(Redirect::to("/").into_response());
    };

    let article = store::day_article(&state.pool, date)
        .await
        .into_diagnostic()?
        .unwrap_or_else(|| Article::blank(year, month, day));

    Ok(EditPage {
        notice: session::take_notice(&session).await.into_diagnostic()?,
        csrf_token: session::issue_csrf_token(&session).await.into_diagnostic()?,
        article,
        config: state.config,
    }
    .into_response())
}

async fn update(
    State(state): State<DiaryState>,
    session: Session,
    Form(form): Form<UpdateForm>,
) -> Result<Response, DiaryError> {
    let logged_in = session::is_logged_in(&session).await.into_diagnostic()?;
    let token_ok = session::verify_csrf_token(&session, &form.csrf_token)
        .await
        .into_diagnostic()?;
    if !logged_in || !token_ok {
        tracing::warn!(logged_in, token_ok, "rejected update");
        return Ok(Redirect::to("/").into_response());
    }

    let Some(date) = NaiveDate::from_ymd_opt(form.year, form.month, form.day) else {
        return Ok(Redirect::to("/").into_response());
    };
    let label = ViewMode::Day(date).label();

    let message = form.message.replace("\r\n", "\n");
    if message.is_empty() {
        store::delete(&state.pool, date).await.into_diagnostic()?;
        session::set_notice(&session, &format!("Deleted entry for {label}."))
            .await
            .into_diagnostic()?;
    } else {
        let article = Article {
            year: form.year,
            month: form.month,
            day: form.day,
            message,
        };
        store::upsert(&state.pool, &article).await.into_diagnostic()?;
        session::set_notice(&session, &format!("Saved entry for {label}."))
            .await
            .into_diagnostic()?;
    }

    Ok(Redirect::to(&ViewMode::Month(form.year, form.month).href()).into_response())
}

async fn login(
    State(state): State<DiaryState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, DiaryError> {
    let token_ok = session::verify_csrf_token(&session, &form.csrf_token)
        .await
        .into_diagnostic()?;
    if token_ok && form.password == state.config.password {
        session::set_logged_in(&session, true).await.into_diagnostic()?;
        session::set_notice(&session, "Logged in.").await.into_diagnostic()?;
    } else {
        tracing::warn!(token_ok, "rejected login attempt");
        session::set_notice(&session, "Login failed.").await.into_diagnostic()?;
    }
    Ok(Redirect::to("/").into_response())
}

async fn logout(session: Session) -> Result<Response, DiaryError> {
    session::set_logged_in(&session, false).await.into_diagnostic()?;
    session::set_notice(&session, "Logged out.").await.into_diagnostic()?;
    Ok(Redirect::to("/").into_response())
}

async fn not_found(State(state): State<DiaryState>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundPage {
            config: state.config,
            notice: None,
        },
    )
}

pub(crate) fn router(state: DiaryState) -> Router {
    Router::new()
        .route("/", get(show))
        .route("/search", get(search))
        .route("/edit", get(edit))
        .route("/update", post(update))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(get(not_found))
        .with_state(state)
}

pub(crate) async fn open_pool(db_path: &str) -> miette::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    SqlitePool::connect_with(options).await.into_diagnostic()
}

pub async fn serve(config: ServerConfig) -> miette::Result<()> {
    let pool = open_pool(&config.db_path).await?;
    store::init_schema(&pool).await.into_diagnostic()?;

    let state = DiaryState {
        pool,
        config: config.clone(),
    };
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    let app = router(state).layer(session_layer);

    let listener = TcpListener::bind(&config.addr).await.into_diagnostic()?;
    tracing::info!(addr = %config.addr, db = %config.db_path, "serving diary");
    axum::serve(listener, app.into_make_service())
        .await
        .into_diagnostic()?;
    Ok(())
}
