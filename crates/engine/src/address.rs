use async_trait::async_trait;

use campaign_common::error::AppResult;

use crate::providers::AddressResolver;

/// Resolves mail addresses from corporate usernames (UPNs).
///
/// A UPN in the corporate mail domain doubles as the recipient's address.
pub struct UpnAddressResolver {
    domain: String,
}

impl UpnAddressResolver {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    fn address_for(&self, corporate_username: &str) -> Option<String> {
        let upn = corporate_username.trim();
        let (alias, domain) = upn.split_once('@')?;
        let plausible = !alias.is_empty()
            && !domain.contains('@')
            && !upn.chars().any(char::is_whitespace)
            && domain.eq_ignore_ascii_case(&self.domain);
        plausible.then(|| upn.to_string())
    }
}

#[async_trait]
impl AddressResolver for UpnAddressResolver {
    async fn resolve(&self, corporate_username: &str) -> AppResult<Option<String>> {
        Ok(self.address_for(corporate_username))
    }
}
