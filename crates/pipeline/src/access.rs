/// Check whether a requester may use the bot.
///
/// An empty allow-list means everyone is allowed (open policy).
#[must_use]
pub fn is_authorized(user_id: u64, allow_list: &[u64]) -> bool {
    allow_list.is_empty() || allow_list.contains(&user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_allows_everyone() {
        assert!(is_authorized(42, &[]));
        assert!(is_authorized(0, &[]));
    }

    #[test]
    fn listed_user_is_allowed() {
        let list = [1, 2, 3];
        assert!(is_authorized(2, &list));
    }

    #[test]
    fn unlisted_user_is_denied() {
        let list = [1, 2, 3];
        assert!(!is_authorized(4, &list));
    }
}
