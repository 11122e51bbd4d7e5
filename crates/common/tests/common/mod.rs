//! Shared fixtures for catalog integration tests
#![allow(dead_code)]

use common::prelude::*;

pub const USER1: UserId = UserId(1);
pub const USER2: UserId = UserId(2);
pub const INACTIVE: UserId = UserId(4);
pub const TEAM: GroupId = GroupId(10);

pub struct Tokens {
    pub user1: AuthToken,
    pub user2: AuthToken,
    pub inactive: AuthToken,
}

/// `/pub` public, `/private/u1` owned by user1, `/team` owned by the team
/// group, plus a handful of artifacts under each.
pub async fn setup_catalog() -> (Catalog<MemoryCatalogProvider>, Tokens) {
    let provider = MemoryCatalogProvider::new();

    provider.insert_account(Account::new(USER1, true, [])).unwrap();
    provider
        .insert_account(Account::new(USER2, true, [TEAM]))
        .unwrap();
    provider
        .insert_account(Account::new(INACTIVE, false, [TEAM]))
        .unwrap();

    let tokens = Tokens {
        user1: AuthToken::generate(USER1, "laptop"),
        user2: AuthToken::generate(USER2, "ci"),
        inactive: AuthToken::generate(INACTIVE, "old"),
    };
    for token in [&tokens.user1, &tokens.user2, &tokens.inactive] {
        provider.insert_token(token).unwrap();
    }

    for directory in [
        Directory::new("/pub", Owner::Anonymous, true).unwrap(),
        Directory::new("/private/u1", Owner::User(USER1), false).unwrap(),
        Directory::new("/team", Owner::Group(TEAM), false).unwrap(),
    ] {
        provider.insert_directory(directory).unwrap();
    }

    for (key, size) in [
        ("pub/debian/file.iso", 100),
        ("pub2/stray.txt", 5),
        ("private/u1/x.txt", 7),
        ("team/build/log.txt", 3),
    ] {
        provider
            .insert_artifact(Artifact::new(key, true, size).unwrap())
            .unwrap();
    }

    let catalog = Catalog::load(provider).await.unwrap();
    (catalog, tokens)
}

pub fn p(path: &str) -> StorePath {
    StorePath::parse(path).unwrap()
}
