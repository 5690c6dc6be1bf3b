//! Session state: logged-in flag, one-shot CSRF token, one-shot notice.

use rand::distr::{Alphanumeric, SampleString};
use tower_sessions::{session::Error, Session};

const LOGGED_IN: &str = "logged_in";
const CSRF_TOKEN: &str = "csrf_token";
const NOTICE: &str = "notice";

const TOKEN_LEN: usize = 64;

pub async fn is_logged_in(session: &Session) -> Result<bool, Error> {
    Ok(session.get::<bool>(LOGGED_IN).await?.unwrap_or(false))
}

pub async fn set_logged_in(session: &Session, logged_in: bool) -> Result<(), Error> {
    session.insert(LOGGED_IN, logged_in).await
}

/// Mint a fresh token and store it, replacing any previous one. Every page
/// render issues a new token, so only the most recently rendered form can
/// submit.
pub async fn issue_csrf_token(session: &Session) -> Result<String, Error> {
    let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LEN);
    session.insert(CSRF_TOKEN, &token).await?;
    Ok(token)
}

/// One-shot check: the stored token is removed whether or not it matches.
pub async fn verify_csrf_token(session: &Session, form_token: &str) -> Result<bool, Error> {
    let stored: Option<String> = session.remove(CSRF_TOKEN).await?;
    Ok(stored.is_some_and(|token| !token.is_empty() && token == form_token))
}

pub async fn set_notice(session: &Session, message: &str) -> Result<(), Error> {
    session.insert(NOTICE, message).await
}

/// Read and clear the pending notice.
pub async fn take_notice(session: &Session) -> Result<Option<String>, Error> {
    session.remove(NOTICE).await
}
