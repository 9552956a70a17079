//! Users command - CRUD against the configured database.

use crate::cli::args::{FindArgs, UsersAction, UsersArgs};
use crate::config::Config;
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, UserRepository, UserStore};

/// Execute the users command
pub async fn execute(args: UsersArgs, config: Config) -> AppResult<()> {
    // Schema is the migrate command's job
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::store("connect", e))?;
    let repo = UserStore::new(db.into_connection());

    let result = run(&repo, args.action).await;
    let output = settle(result, repo.close().await)?;

    println!("{}", output);
    Ok(())
}

/// The command outcome wins over a failed close
fn settle(result: AppResult<String>, closed: AppResult<()>) -> AppResult<String> {
    if let Err(e) = closed {
        tracing::warn!(error = %e, "Failed to close database connection");
    }
    result
}

/// Apply a users action and render its outcome.
pub async fn run(repo: &dyn UserRepository, action: UsersAction) -> AppResult<String> {
    match action {
        UsersAction::Create {
            username,
            email,
            first_name,
            last_name,
        } => {
            let user = User::with_names(
                username,
                email,
                first_name.unwrap_or_default(),
                last_name.unwrap_or_default(),
            );
            if !user.is_valid() {
                return Err(AppError::validation("username and email are required"));
            }

            let created = repo.create(user).await?;
            tracing::info!(id = created.id, "User created");
            render(&created)
        }
        UsersAction::Get { id } => render_lookup(repo.find_by_id(id).await?, &format!("id {}", id)),
        UsersAction::Find(FindArgs { username, email }) => match (username, email) {
            (Some(username), _) => render_lookup(
                repo.find_by_username(&username).await?,
                &format!("username '{}'", username),
            ),
            (None, Some(email)) => render_lookup(
                repo.find_by_email(&email).await?,
                &format!("email '{}'", email),
            ),
            (None, None) => Err(AppError::validation("either --username or --email is required")),
        },
        UsersAction::List => {
            let users = repo.find_all().await?;
            Ok(serde_json::to_string_pretty(&users)?)
        }
        UsersAction::Count => Ok(repo.count().await?.to_string()),
        UsersAction::Update {
            id,
            username,
            email,
            first_name,
            last_name,
        } => {
            let Some(mut user) = repo.find_by_id(id).await? else {
                return Err(AppError::not_found(id));
            };

            if let Some(username) = username {
                user.username = username;
            }
            if let Some(email) = email {
                user.email = email;
            }
            if let Some(first_name) = first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                user.last_name = last_name;
            }
            if !user.is_valid() {
                return Err(AppError::validation("username and email must not be empty"));
            }

            repo.update(&mut user).await?;
            tracing::info!(id, "User updated");
            render(&user)
        }
        UsersAction::Delete { id } => {
            repo.delete(id).await?;
            tracing::info!(id, "User deleted");
            Ok(format!("Deleted user {}", id))
        }
        UsersAction::Purge { yes } => {
            if !yes {
                return Err(AppError::validation("refusing to delete all users without --yes"));
            }
            repo.delete_all().await?;
            tracing::warn!("All users deleted");
            Ok("Deleted all users".to_string())
        }
    }
}

fn render(user: &User) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(user)?)
}

fn render_lookup(user: Option<User>, key: &str) -> AppResult<String> {
    match user {
        Some(user) => render(&user),
        None => Ok(format!("No user with {}", key)),
    }
}
