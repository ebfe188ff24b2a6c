use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;

/// Makes sure the configured administrator exists, is approved and can log in
/// with the configured password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let email = admin.email.as_str();
    let now = state.now();

    if let Some(user) = repositories::users::find_by_email(state.db(), email).await? {
        let password_matches =
            security::verify_password(&admin.password, &user.hashed_password)
                .unwrap_or(false);
        let up_to_date = password_matches
            && user.role == UserRole::Admin
            && user.status == AccountStatus::Approved;

        if up_to_date {
            tracing::info!(email, "bootstrap admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            None
        } else {
            Some(security::hash_password(&admin.password)?)
        };

        repositories::users::promote_to_admin(state.db(), &user.id, hashed_password).await?;
        tracing::info!(email, "bootstrap admin updated");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            fullname: &admin.fullname,
            email,
            hashed_password,
            role: UserRole::Admin,
            status: AccountStatus::Approved,
            class_name: None,
            gender: None,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(email, "bootstrap admin created");
    Ok(())
}
