//! SQLite access for the `articles` table.

use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;

use crate::article::Article;

/// Search results are cut off past this many rows.
pub const SEARCH_LIMIT: usize = 20;

const CREATE_TABLE_ARTICLES: &str = "\
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    day INTEGER NOT NULL,
    message TEXT NOT NULL
)";

const CREATE_INDEX_ARTICLE_YMD: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS article_ymd_idx ON articles (year, month, day)";

pub async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(CREATE_TABLE_ARTICLES).execute(pool).await?;
    sqlx::query(CREATE_INDEX_ARTICLE_YMD).execute(pool).await?;
    Ok(())
}

pub async fn month_articles(pool: &SqlitePool, year: i32, month: u32) -> sqlx::Result<Vec<Article>> {
    sqlx::query_as(
        "SELECT year, month, day, message FROM articles
         WHERE year = ? AND month = ? ORDER BY day",
    )
    .bind(year)
    .bind(month)
    .fetch_all(pool)
    .await
}

pub async fn year_articles(pool: &SqlitePool, year: i32) -> sqlx::Result<Vec<Article>> {
    sqlx::query_as(
        "SELECT year, month, day, message FROM articles
         WHERE year = ? ORDER BY month, day",
    )
    .bind(year)
    .fetch_all(pool)
    .await
}

pub async fn all_articles(pool: &SqlitePool) -> sqlx::Result<Vec<Article>> {
    sqlx::query_as("SELECT year, month, day, message FROM articles ORDER BY year, month, day")
        .fetch_all(pool)
        .await
}

pub async fn day_article(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<Option<Article>> {
    sqlx::query_as(
        "SELECT year, month, day, message FROM articles
         WHERE year = ? AND month = ? AND day = ?",
    )
    .bind(date.year())
    .bind(date.month())
    .bind(date.day())
    .fetch_optional(pool)
    .await
}

/// Date of the oldest stored entry, the lower bound for interpolation.
pub async fn first_entry_date(pool: &SqlitePool) -> sqlx::Result<Option<NaiveDate>> {
    let row: Option<(i32, u32, u32)> =
        sqlx::query_as("SELECT year, month, day FROM articles ORDER BY year, month, day LIMIT 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day)))
}

/// Keyword search: whitespace-separated fragments are AND-ed `LIKE`
/// predicates, newest entries first. Returns the matches (at most
/// [`SEARCH_LIMIT`]) and whether more were cut off.
pub async fn search(pool: &SqlitePool, keyword: &str) -> sqlx::Result<(Vec<Article>, bool)> {
    let fragments: Vec<String> = keyword.split_whitespace().map(escape_like).collect();
    if fragments.is_empty() {
        return Ok((Vec::new(), false));
    }

    let mut sql = String::from("SELECT year, month, day, message FROM articles");
    for (i, _) in fragments.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str("message LIKE ? ESCAPE '!'");
    }
    sql.push_str(" ORDER BY year DESC, month DESC, day DESC LIMIT ?");

    let mut query = sqlx::query_as::<_, Article>(&sql);
    for fragment in &fragments {
        query = query.bind(format!("%{fragment}%"));
    }
    let mut articles = query
        .bind((SEARCH_LIMIT + 1) as i64)
        .fetch_all(pool)
        .await?;

    let limited = articles.len() > SEARCH_LIMIT;
    articles.truncate(SEARCH_LIMIT);
    Ok((articles, limited))
}

/// Insert or replace the entry for the article's date.
pub async fn upsert(pool: &SqlitePool, article: &Article) -> sqlx::Result<()> {
    sqlx::query("REPLACE INTO articles (year, month, day, message) VALUES (?, ?, ?, ?)")
        .bind(article.year)
        .bind(article.month)
        .bind(article.day)
        .bind(&article.message)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM articles WHERE year = ? AND month = ? AND day = ?")
        .bind(date.year())
        .bind(date.month())
        .bind(date.day())
        .execute(pool)
        .await?;
    Ok(())
}

/// Escape the SQL LIKE wildcards (and the escape character itself) with `!`.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(ch);
    }
    escaped
}
