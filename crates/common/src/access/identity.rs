use crate::catalog::{Catalog, CatalogProvider};
use crate::model::Principal;

impl<P: CatalogProvider> Catalog<P> {
    /// Resolve the principal behind an optional token secret.
    ///
    /// Never fails: a missing, unknown or inactive token is Anonymous, and so
    /// is a token that could not be looked up because the provider failed.
    /// Callers cannot tell these cases apart.
    pub async fn resolve_principal(&self, token: Option<&str>) -> Principal {
        let Some(secret) = token.map(str::trim).filter(|s| !s.is_empty()) else {
            return Principal::Anonymous;
        };

        match self.provider().account_for_token(secret).await {
            Ok(account) => Principal::from(account),
            Err(e) => {
                tracing::warn!("token lookup failed, continuing as anonymous: {}", e);
                Principal::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Catalog, MemoryCatalogProvider};
    use crate::model::{Account, AuthToken, GroupId, Principal, UserId};

    async fn setup() -> (Catalog<MemoryCatalogProvider>, AuthToken, AuthToken, AuthToken) {
        let provider = MemoryCatalogProvider::new();
        provider
            .insert_account(Account::new(UserId(1), true, []))
            .unwrap();
        provider
            .insert_account(Account::new(UserId(2), true, [GroupId(10)]))
            .unwrap();
        provider
            .insert_account(Account::new(UserId(4), false, [GroupId(10)]))
            .unwrap();

        let token1 = AuthToken::generate(UserId(1), "");
        let token2 = AuthToken::generate(UserId(2), "");
        let token4 = AuthToken::generate(UserId(4), "");
        for token in [&token1, &token2, &token4] {
            provider.insert_token(token).unwrap();
        }

        let catalog = Catalog::load(provider).await.unwrap();
        (catalog, token1, token2, token4)
    }

    #[tokio::test]
    async fn test_no_or_unknown_token_is_anonymous() {
        let (catalog, _, _, _) = setup().await;
        assert_eq!(catalog.resolve_principal(None).await, Principal::Anonymous);
        assert_eq!(catalog.resolve_principal(Some("")).await, Principal::Anonymous);
        assert_eq!(
            catalog
                .resolve_principal(Some("00000000000000000000000000000000"))
                .await,
            Principal::Anonymous
        );
    }

    #[tokio::test]
    async fn test_active_user_with_groups() {
        let (catalog, token1, token2, _) = setup().await;

        let principal = catalog.resolve_principal(Some(&token1.secret)).await;
        assert!(principal.is_user(UserId(1)));

        let principal = catalog.resolve_principal(Some(&token2.secret)).await;
        assert!(principal.is_user(UserId(2)));
        assert!(principal.in_group(GroupId(10)));
    }

    #[tokio::test]
    async fn test_second_token_for_same_user() {
        let (catalog, token1, _, _) = setup().await;
        let token1bis = AuthToken::generate(UserId(1), "second device");
        catalog.provider().insert_token(&token1bis).unwrap();

        assert_eq!(
            catalog.resolve_principal(Some(&token1.secret)).await,
            catalog.resolve_principal(Some(&token1bis.secret)).await
        );
    }

    #[tokio::test]
    async fn test_inactive_user_is_anonymous() {
        let (catalog, _, _, token4) = setup().await;
        assert_eq!(
            catalog.resolve_principal(Some(&token4.secret)).await,
            Principal::Anonymous
        );
    }
}
