//! The bit-exact cache key schema.

use chat_common::{ids::MessageId, UserId};

#[must_use]
pub fn connection_key(user_id: &UserId) -> String {
    format!("ws:connection:{user_id}")
}

#[must_use]
pub fn inbox_key(user_id: &UserId) -> String {
    format!("inbox:{user_id}")
}

#[must_use]
pub fn message_key(message_id: MessageId) -> String {
    format!("msg:{message_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_the_documented_schema() {
        let user = UserId::new("u_bob");
        assert_eq!(connection_key(&user), "ws:connection:u_bob");
        assert_eq!(inbox_key(&user), "inbox:u_bob");

        let message_id = MessageId::generate();
        assert_eq!(message_key(message_id), format!("msg:{message_id}"));
    }
}
