use crate::domain::UserId;

/// Whether `user_id` may use the bot.
///
/// An empty allow-list leaves the bot open; a message without a sender is
/// only accepted in that case.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}
