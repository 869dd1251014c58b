use voicewatch_presence::UserId;

/// A non-owner tried to run an owner-only command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {user} is not allowed to run owner commands")]
pub struct AuthorizationError {
    pub user: UserId,
}

/// Owner commands are gated to exactly one configured identity.
pub fn authorize(user: &UserId, owner: &UserId) -> Result<(), AuthorizationError> {
    if user == owner {
        Ok(())
    } else {
        Err(AuthorizationError { user: user.clone() })
    }
}
