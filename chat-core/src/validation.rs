//! Local request validation.
//!
//! Checks run before a request is handed to the transport. A failed check
//! means the request is never sent.

use chat_types::{ChatType, ValidationError};

/// Maximum number of participant ids accepted by `create_chat`.
pub const MAX_CHAT_PARTICIPANTS: usize = 2;

/// Validate the arguments of a create-chat request.
///
/// More than [`MAX_CHAT_PARTICIPANTS`] ids are rejected for every chat type.
pub fn validate_create_chat(
    _chat_type: ChatType,
    participants: &[String],
) -> Result<(), ValidationError> {
    if participants.len() > MAX_CHAT_PARTICIPANTS {
        return Err(ValidationError {
            field: "users".to_string(),
            error: "In user list should be only two users, and type of chat should be SUC."
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_users_are_accepted() {
        assert!(validate_create_chat(ChatType::Suc, &users(&["a", "b"])).is_ok());
        assert!(validate_create_chat(ChatType::Muc, &users(&["a", "b"])).is_ok());
    }

    #[test]
    fn fewer_users_are_accepted() {
        assert!(validate_create_chat(ChatType::Suc, &users(&["a"])).is_ok());
        assert!(validate_create_chat(ChatType::Muc, &[]).is_ok());
    }

    #[test]
    fn three_users_are_rejected_for_any_type() {
        for chat_type in [ChatType::Suc, ChatType::Muc] {
            let err = validate_create_chat(chat_type, &users(&["a", "b", "c"])).unwrap_err();
            assert_eq!(err.field, "users");
            assert!(err.error.contains("only two users"));
        }
    }
}
