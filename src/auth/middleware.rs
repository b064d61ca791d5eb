use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::{verify_token, TokenType};
use crate::error::AppError;
use crate::models::member::MemberRole;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: MemberRole,
}

impl AuthUser {
    /// Diary, cart and order pages are for buyers only. Handlers call this
    /// first thing.
    pub fn require_buyer(&self) -> Result<(), AppError> {
        if self.role != MemberRole::Buyer {
            tracing::warn!(
                member_id = %self.id,
                role = self.role.as_str(),
                "Non-buyer rejected from buyer page"
            );
            return Err(AppError::Forbidden("Only buyers can use this page".into()));
        }
        Ok(())
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(token, &state.config)?;

    if token_data.claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }

    let auth_user = AuthUser {
        id: token_data.claims.sub,
        username: token_data.claims.username,
        role: token_data.claims.role,
    };

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: MemberRole) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "member".into(),
            role,
        }
    }

    #[test]
    fn only_buyers_pass() {
        assert!(user(MemberRole::Buyer).require_buyer().is_ok());
        assert!(matches!(
            user(MemberRole::Seller).require_buyer(),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            user(MemberRole::Admin).require_buyer(),
            Err(AppError::Forbidden(_))
        ));
    }
}
