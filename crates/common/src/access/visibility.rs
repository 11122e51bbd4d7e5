use crate::catalog::DirectoryIndex;
use crate::model::{Directory, Owner, Principal};
use crate::path;

/// Whether `principal` may see `directory` and everything it governs.
///
/// Public directories are visible to everyone. Otherwise the owning user,
/// or any member of the owning group, sees it. An anonymous-owned directory
/// that is not public should not exist; if one does, every authenticated
/// principal sees it and Anonymous does not.
pub fn is_visible(directory: &Directory, principal: &Principal) -> bool {
    if directory.is_public() {
        return true;
    }
    match directory.owner() {
        Owner::User(user) => principal.is_user(user),
        Owner::Group(group) => principal.in_group(group),
        Owner::Anonymous => !principal.is_anonymous(),
    }
}

/// How the directory governing a path relates to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Governed<'a> {
    /// No directory record covers the path
    Ungoverned,
    Visible(&'a Directory),
    Hidden(&'a Directory),
}

pub fn governed<'a>(index: &'a DirectoryIndex, path: &str, principal: &Principal) -> Governed<'a> {
    match index.governing(path) {
        None => Governed::Ungoverned,
        Some(directory) if is_visible(directory, principal) => Governed::Visible(directory),
        Some(directory) => Governed::Hidden(directory),
    }
}

/// Whether `target` can be reached from `from` without crossing a directory
/// the principal cannot see.
///
/// Checks every explicit directory at or above `target` and strictly below
/// `from`. Directories at or above `from` are the caller's concern.
pub fn reachable(index: &DirectoryIndex, from: &str, target: &str, principal: &Principal) -> bool {
    path::ancestors(target)
        .take_while(|ancestor| *ancestor != from && path::is_within(from, ancestor))
        .filter_map(|ancestor| index.get(ancestor))
        .all(|directory| is_visible(directory, principal))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::{GroupId, UserId};

    fn user(id: i64) -> Principal {
        Principal::User {
            id: UserId(id),
            groups: BTreeSet::new(),
        }
    }

    fn member(id: i64, group: i64) -> Principal {
        Principal::User {
            id: UserId(id),
            groups: [GroupId(group)].into_iter().collect(),
        }
    }

    #[test]
    fn test_public_visible_to_everyone() {
        let owners = [
            Owner::User(UserId(1)),
            Owner::Group(GroupId(1)),
            Owner::Anonymous,
        ];
        for owner in owners {
            let dir = Directory::new("/pub", owner, true).unwrap();
            for principal in [Principal::Anonymous, user(1), user(2), member(3, 1)] {
                assert!(is_visible(&dir, &principal));
            }
        }
    }

    #[test]
    fn test_user_owned() {
        let dir = Directory::new("/private/u1", Owner::User(UserId(1)), false).unwrap();
        assert!(is_visible(&dir, &user(1)));
        assert!(!is_visible(&dir, &user(2)));
        assert!(!is_visible(&dir, &member(2, 1)));
        assert!(!is_visible(&dir, &Principal::Anonymous));
    }

    #[test]
    fn test_group_owned() {
        let dir = Directory::new("/private/group", Owner::Group(GroupId(7)), false).unwrap();
        assert!(is_visible(&dir, &member(2, 7)));
        assert!(is_visible(&dir, &member(3, 7)));
        assert!(!is_visible(&dir, &member(1, 8)));
        assert!(!is_visible(&dir, &user(7)));
        assert!(!is_visible(&dir, &Principal::Anonymous));
    }

    #[test]
    fn test_anonymous_private_needs_authentication() {
        let dir = Directory::unchecked(
            crate::path::StorePath::parse("/anonymous").unwrap(),
            Owner::Anonymous,
            false,
        );
        assert!(is_visible(&dir, &user(1)));
        assert!(is_visible(&dir, &member(2, 7)));
        assert!(!is_visible(&dir, &Principal::Anonymous));
    }

    #[test]
    fn test_governed() {
        let index = DirectoryIndex::new(vec![
            Directory::new("/pub", Owner::Anonymous, true).unwrap(),
            Directory::new("/private/u1", Owner::User(UserId(1)), false).unwrap(),
        ]);
        assert!(matches!(
            governed(&index, "/pub/x", &Principal::Anonymous),
            Governed::Visible(_)
        ));
        assert!(matches!(
            governed(&index, "/private/u1/x", &Principal::Anonymous),
            Governed::Hidden(_)
        ));
        assert!(matches!(
            governed(&index, "/private/u1/x", &user(1)),
            Governed::Visible(_)
        ));
        assert_eq!(
            governed(&index, "/private", &user(1)),
            Governed::Ungoverned
        );
    }

    #[test]
    fn test_reachable_stops_at_hidden_directory() {
        let index = DirectoryIndex::new(vec![
            Directory::new("/private/u1", Owner::User(UserId(1)), false).unwrap(),
            Directory::new("/private/u1/shared", Owner::Anonymous, true).unwrap(),
        ]);
        assert!(!reachable(&index, "/private", "/private/u1/shared", &Principal::Anonymous));
        assert!(reachable(&index, "/private", "/private/u1/shared", &user(1)));
        assert!(reachable(&index, "/private/u1", "/private/u1/shared", &Principal::Anonymous));
        assert!(reachable(&index, "/", "/elsewhere/x", &Principal::Anonymous));
    }
}
