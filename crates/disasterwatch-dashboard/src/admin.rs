//! One-shot account and admin commands.
//!
//! Admin commands check the stored session first and ask for confirmation
//! before destructive calls, unless `--yes` is given. The backend enforces
//! the same rules; the local check only avoids a pointless round trip.

use std::path::Path;

use chrono::Utc;
use disasterwatch_client::{ApiClient, ClientError, LoginForm, SignupForm, UserDirectory};
use disasterwatch_core::controller::ACCESS_DENIED;
use disasterwatch_core::export::Report;
use disasterwatch_core::feed::EventFeed;
use disasterwatch_core::{BackendError, Session, SessionContext};
use disasterwatch_types::{EventId, SeverityFilter, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::error::DashboardError;
use crate::watch::confirm;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Sign in and persist the session.
pub async fn login(
    client: &ApiClient,
    session: &SessionContext,
    email: &str,
    password: String,
) -> Result<(), DashboardError> {
    let auth = client.login(&LoginForm::new(email, password)).await?;
    let role = auth.user.role;
    let name = display_name(auth.user.fullname.as_deref(), auth.user.email.as_deref());
    session.sign_in(auth)?;
    println!("Signed in as {name} ({role}).");
    Ok(())
}

/// Register a new account.
pub async fn signup(
    client: &ApiClient,
    fullname: &str,
    email: &str,
    password: String,
) -> Result<(), DashboardError> {
    client.signup(&SignupForm::new(fullname, email, password)).await?;
    println!("Account created. Sign in with `disasterwatch login`.");
    Ok(())
}

/// Forget the stored session.
pub fn logout(session: &SessionContext) -> Result<(), DashboardError> {
    session.sign_out()?;
    println!("Signed out.");
    Ok(())
}

/// Describe the stored session.
pub fn whoami(session: &SessionContext) {
    println!("{}", describe_session(&session.current()));
}

fn describe_session(session: &Session) -> String {
    if !session.is_authenticated() {
        return String::from("Not signed in.");
    }
    let profile = session.profile.clone().unwrap_or_default();
    let name = display_name(profile.fullname.as_deref(), profile.email.as_deref());
    format!("{name} (role: {})", session.role())
}

fn display_name(fullname: Option<&str>, email: Option<&str>) -> String {
    fullname
        .filter(|n| !n.trim().is_empty())
        .or(email)
        .unwrap_or("unknown user")
        .to_owned()
}

// ---------------------------------------------------------------------------
// User administration
// ---------------------------------------------------------------------------

/// Print the registered users.
pub async fn list_users(client: &ApiClient, session: &SessionContext) -> Result<(), DashboardError> {
    let token = session.current().token;
    let directory = UserDirectory::load(client, token.as_deref()).await?;
    if directory.is_empty() {
        println!("No registered users.");
        return Ok(());
    }
    for user in directory.users() {
        println!(
            "[{}] {:<24} {:<32} {:<6} {}",
            user.initial(),
            user.fullname.as_deref().unwrap_or("-"),
            user.email.as_deref().unwrap_or("-"),
            user.role,
            user.id
        );
    }
    Ok(())
}

/// Delete a user account.
pub async fn ban_user(
    client: &ApiClient,
    session: &SessionContext,
    id: &UserId,
    assume_yes: bool,
) -> Result<(), DashboardError> {
    if !assume_yes && !ask("Are you sure you want to ban this user?").await? {
        println!("Cancelled.");
        return Ok(());
    }
    let token = session.current().token;
    client
        .delete_user(token.as_deref(), id)
        .await
        .map_err(|e| user_failure(e, "Failed to delete user.", "Error deleting user."))?;
    info!(%id, "user banned");
    println!("User {id} deleted.");
    Ok(())
}

/// Grant the admin role to a user.
pub async fn promote_user(
    client: &ApiClient,
    session: &SessionContext,
    id: &UserId,
) -> Result<(), DashboardError> {
    let token = session.current().token;
    client
        .promote_user(token.as_deref(), id)
        .await
        .map_err(|e| user_failure(e, "Failed to promote user.", "Error promoting user."))?;
    println!("User {id} is now an admin.");
    Ok(())
}

/// Map a user-admin failure to the message shown for it: the backend
/// refusing gets `failed`, an unreachable backend gets `errored`.
fn user_failure(err: ClientError, failed: &str, errored: &str) -> DashboardError {
    let message = match err {
        ClientError::Status { .. } => failed.to_owned(),
        ClientError::Transport(_) | ClientError::Decode(_) => errored.to_owned(),
        other => return DashboardError::from(other),
    };
    DashboardError::Command { message }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Delete one alert.
pub async fn delete_alert(
    client: &ApiClient,
    session: &SessionContext,
    id: &EventId,
    assume_yes: bool,
) -> Result<(), DashboardError> {
    let current = session.current();
    let token = match current.token.as_deref() {
        Some(token) if current.is_admin() => token,
        _ => return Err(DashboardError::AccessDenied(ACCESS_DENIED)),
    };
    if !assume_yes && !ask("Are you sure you want to delete this report?").await? {
        println!("Cancelled.");
        return Ok(());
    }
    if let Err(e) = client.remove_alert(id, token).await {
        return Err(DashboardError::Command {
            message: BackendError::from(e).delete_failure_message(),
        });
    }
    println!("Event {id} deleted.");
    Ok(())
}

/// Fetch the snapshot and write a report of it.
pub async fn export(
    client: &ApiClient,
    session: &SessionContext,
    path: &Path,
    filter: SeverityFilter,
) -> Result<(), DashboardError> {
    if !session.current().is_admin() {
        return Err(DashboardError::AccessDenied(ACCESS_DENIED));
    }
    let records = client.list_alerts().await?;
    let mut feed = EventFeed::default();
    feed.apply_snapshot(&records);
    feed.set_filter(filter);

    let report = Report::capture(&feed, Utc::now());
    let format = report.write_to(path)?;
    info!(path = %path.display(), ?format, events = report.events.len(), "report exported");
    println!(
        "Report written to {} ({} of {} events).",
        path.display(),
        report.events.len(),
        report.stats.total
    );
    Ok(())
}

async fn ask(question: &str) -> Result<bool, DashboardError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    confirm(&mut lines, question).await
}
