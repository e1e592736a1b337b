//! Pure operations over an identity list.

use rand::Rng;

use super::types::{IdentityList, MailboxIdentity};

/// Length of generated identity IDs.
pub const IDENTITY_ID_LENGTH: usize = 21;

/// URL-safe alphabet for identity IDs.
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Result of [`add_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// The list after the operation.
    pub list: IdentityList,
    /// The new mailbox, or `None` if the display name was already present.
    pub created: Option<MailboxIdentity>,
}

/// Generate a random identity ID.
///
/// Drawn from the thread-local CSPRNG, so concurrent requests need no
/// coordination.
pub fn generate_identity_id() -> String {
    let mut rng = rand::rng();
    (0..IDENTITY_ID_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}

/// Address for a display name under the given domain.
pub fn mailbox_address(display_name: &str, domain: &str) -> String {
    format!("{display_name}@{domain}")
}

/// Append a mailbox for `display_name` unless one already exists.
///
/// Matching is exact and case-sensitive. When the name is present the list is
/// returned untouched and `created` is `None`.
pub fn add_if_absent(list: IdentityList, display_name: &str, domain: &str) -> AddOutcome {
    if list.contains_name(display_name) {
        return AddOutcome {
            list,
            created: None,
        };
    }

    let identity = MailboxIdentity {
        id: generate_identity_id(),
        display_name: display_name.to_string(),
        address: mailbox_address(display_name, domain),
    };

    let mut list = list;
    list.push(identity.clone());

    AddOutcome {
        list,
        created: Some(identity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_identity_id_shape() {
        let id = generate_identity_id();
        assert_eq!(id.len(), IDENTITY_ID_LENGTH);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_identity_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_identity_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_add_to_empty_list() {
        let outcome = add_if_absent(IdentityList::new(), "alice", "example.com");

        let created = outcome.created.unwrap();
        assert_eq!(created.display_name, "alice");
        assert_eq!(created.address, "alice@example.com");
        assert_eq!(outcome.list.len(), 1);
        assert_eq!(outcome.list.latest(), Some(&created));
    }

    #[test]
    fn test_add_is_idempotent() {
        let first = add_if_absent(IdentityList::new(), "alice", "example.com");
        let second = add_if_absent(first.list.clone(), "alice", "example.com");

        assert!(second.created.is_none());
        assert_eq!(second.list, first.list);
    }

    #[test]
    fn test_add_preserves_order() {
        let mut list = IdentityList::new();
        for name in ["carol", "alice", "bob"] {
            list = add_if_absent(list, name, "example.com").list;
        }

        let names: Vec<&str> = list.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_add_is_case_sensitive() {
        let list = add_if_absent(IdentityList::new(), "alice", "example.com").list;
        let outcome = add_if_absent(list, "Alice", "example.com");

        assert_eq!(outcome.created.unwrap().address, "Alice@example.com");
        assert_eq!(outcome.list.len(), 2);
    }

    #[test]
    fn test_uniqueness_preserved() {
        let names = ["a", "b", "a", "c", "b", "a", "d"];
        let mut list = IdentityList::new();
        for name in names {
            list = add_if_absent(list, name, "example.com").list;
        }

        let unique: HashSet<&str> = list.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(unique.len(), list.len());
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_duplicate_keeps_original_id() {
        let first = add_if_absent(IdentityList::new(), "alice", "example.com");
        let original_id = first.created.unwrap().id;

        let second = add_if_absent(first.list, "alice", "other.test");
        assert_eq!(second.list.latest().unwrap().id, original_id);
        assert_eq!(second.list.latest().unwrap().address, "alice@example.com");
    }
}
