use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Error;
use crate::types::{AttributeValue, DirectoryEntry, RecordKind, Result, DN, OBJECT_CLASS};
use crate::view::{FieldView, Mutation, Navigation, Route, ViewContext};

/// Form for a new trusted issuer
#[derive(Debug, Clone, Default)]
pub struct IssuerCreateView {
    /// DN typed by the user
    pub issuerdn: Option<String>,
    /// Attributes typed by the user
    pub issuerdata: Option<BTreeMap<String, AttributeValue>>,
}

impl IssuerCreateView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dn(&mut self, dn: impl Into<String>) {
        self.issuerdn = Some(dn.into());
    }

    /// Set one attribute; `dn` and `objectClass` are not attributes here
    pub fn set_field(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        if name == DN || name == OBJECT_CLASS {
            return Err(Error::InvalidRequest(format!("{} cannot be set as an attribute", name)));
        }
        self.issuerdata
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.into());
        Ok(())
    }

    /// Every field of the form is editable, the DN included
    pub fn fields(&self) -> Vec<FieldView> {
        let mut fields: Vec<FieldView> = self
            .issuerdata
            .iter()
            .flatten()
            .map(|(name, value)| FieldView {
                name: name.clone(),
                value: value.clone(),
                editable: true,
            })
            .collect();
        fields.push(FieldView {
            name: DN.to_string(),
            value: self
                .issuerdn
                .clone()
                .map(AttributeValue::Single)
                .unwrap_or(AttributeValue::Null),
            editable: true,
        });
        fields
    }

    /// The entry that would be added, if the form is complete
    pub fn entry(&self) -> Option<DirectoryEntry> {
        let dn = self.issuerdn.as_deref().map(str::trim).filter(|dn| !dn.is_empty())?;
        let data = self.issuerdata.as_ref().filter(|data| !data.is_empty())?;

        let mut entry = DirectoryEntry {
            dn: dn.to_string(),
            attributes: data.clone(),
        };
        entry.set(OBJECT_CLASS, RecordKind::Issuer.object_class());
        Some(entry)
    }

    /// Add the issuer and return to the list.
    ///
    /// An incomplete form is ignored: no request, no message, no navigation.
    pub async fn do_save(&self, ctx: &ViewContext) -> Result<Navigation> {
        let Some(entry) = self.entry() else {
            debug!("Issuer form incomplete, nothing to add");
            return Ok(Navigation::Stay);
        };
        ctx.mutate(Mutation::Add(vec![entry]), Route::Issuers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::MutationPolicy;
    use crate::gateway::{MockGateway, Request};
    use crate::view::testing::context;

    #[tokio::test]
    async fn test_incomplete_form_sends_nothing() {
        let gateway = Arc::new(MockGateway::new());
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let mut view = IssuerCreateView::new();
        assert!(view.do_save(&ctx).await.unwrap().is_stay());

        view.set_field("cn", "ca").unwrap();
        assert!(view.do_save(&ctx).await.unwrap().is_stay());

        let mut view = IssuerCreateView::new();
        view.set_dn("cn=ca,dc=example,dc=com");
        assert!(view.do_save(&ctx).await.unwrap().is_stay());

        view.set_dn("   ");
        view.set_field("cn", "ca").unwrap();
        assert!(view.do_save(&ctx).await.unwrap().is_stay());

        view.issuerdata = Some(BTreeMap::new());
        view.set_dn("cn=ca,dc=example,dc=com");
        assert!(view.do_save(&ctx).await.unwrap().is_stay());

        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_save_tags_entry_as_issuer() {
        let gateway = Arc::new(MockGateway::new());
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let mut view = IssuerCreateView::new();
        view.set_dn("cn=ca,dc=example,dc=com");
        view.set_field("cn", "ca").unwrap();

        let navigation = view.do_save(&ctx).await.unwrap();
        assert_eq!(navigation.route(), Some(&Route::Issuers));
        if let Navigation::Optimistic { pending, .. } = navigation {
            pending.settle().await.unwrap();
        }

        let expected = DirectoryEntry::new("cn=ca,dc=example,dc=com")
            .with("cn", "ca")
            .with(OBJECT_CLASS, "tlsPoolTrustedIssuer");
        assert_eq!(gateway.requests(), vec![Request::Add { values: vec![expected] }]);
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let mut view = IssuerCreateView::new();
        assert!(view.set_field("dn", "cn=x").is_err());
        assert!(view.set_field("objectClass", "top").is_err());
        assert!(view.issuerdata.is_none());

        view.set_field("cn", "x").unwrap();
        let fields = view.fields();
        assert!(fields.iter().all(|f| f.editable));
        assert_eq!(fields.last().unwrap().value, AttributeValue::Null);
    }
}
