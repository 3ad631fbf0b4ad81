use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::Error;
use crate::types::{AttributeValue, DirectoryEntry, RecordKind, Result, DN, OBJECT_CLASS};
use crate::view::{FieldView, Mutation, Navigation, Route, ViewContext};

/// View and edit one trusted issuer.
///
/// On load the entry's `objectClass` is dropped from the working copy and a
/// pristine snapshot is kept; saving sends only the attributes that differ
/// from the snapshot.
#[derive(Debug, Clone)]
pub struct IssuerDetailView {
    issuerdn: String,
    status: bool,
    working: Option<DirectoryEntry>,
    pristine: Option<DirectoryEntry>,
}

impl IssuerDetailView {
    pub fn new(issuerdn: impl Into<String>) -> Self {
        Self {
            issuerdn: issuerdn.into(),
            status: false,
            working: None,
            pristine: None,
        }
    }

    /// Create the view and fetch the entry
    pub async fn mount(ctx: &ViewContext, issuerdn: impl Into<String>) -> Self {
        let mut view = Self::new(issuerdn);
        view.load(ctx).await;
        view
    }

    /// Fetch the entry; a failed search or a missing entry leaves the view
    /// unloaded and read-only
    pub async fn load(&mut self, ctx: &ViewContext) {
        let filter = RecordKind::Issuer.filter();
        let found = match ctx.gateway.search(&self.issuerdn, &filter).await {
            Ok(mut result) => result.take(&self.issuerdn),
            Err(e) => {
                warn!("Could not load issuer {}: {}", self.issuerdn, e);
                None
            }
        };

        match found {
            Some(mut entry) => {
                entry.remove(OBJECT_CLASS);
                self.pristine = Some(entry.clone());
                self.working = Some(entry);
                self.status = true;
            }
            None => {
                debug!("Issuer {} not found", self.issuerdn);
                self.pristine = None;
                self.working = None;
                self.status = false;
            }
        }
    }

    pub fn issuerdn(&self) -> &str {
        &self.issuerdn
    }

    /// True once the entry was loaded
    pub fn status(&self) -> bool {
        self.status
    }

    /// Working copy, including unsaved edits
    pub fn issuerdata(&self) -> Option<&DirectoryEntry> {
        self.working.as_ref()
    }

    /// Attributes for display; `dn` comes last and is never editable
    pub fn fields(&self) -> Vec<FieldView> {
        let Some(entry) = &self.working else {
            return Vec::new();
        };

        let mut fields: Vec<FieldView> = entry
            .attributes
            .iter()
            .map(|(name, value)| FieldView {
                name: name.clone(),
                value: value.clone(),
                editable: self.status,
            })
            .collect();
        fields.push(FieldView {
            name: DN.to_string(),
            value: AttributeValue::Single(entry.dn.clone()),
            editable: false,
        });
        fields
    }

    /// Change one attribute of the working copy
    pub fn set_field(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        let entry = self.editable_entry(name)?;
        entry.set(name, value);
        Ok(())
    }

    /// Remove one attribute from the working copy
    pub fn clear_field(&mut self, name: &str) -> Result<()> {
        let entry = self.editable_entry(name)?;
        entry.remove(name);
        Ok(())
    }

    fn editable_entry(&mut self, name: &str) -> Result<&mut DirectoryEntry> {
        if name == DN || name == OBJECT_CLASS {
            return Err(Error::InvalidRequest(format!("{} is read-only", name)));
        }
        match (self.status, self.working.as_mut()) {
            (true, Some(entry)) => Ok(entry),
            _ => Err(Error::NotFound(format!("issuer {} is not loaded", self.issuerdn))),
        }
    }

    /// Attributes whose working value differs from the snapshot.
    ///
    /// Attributes removed from the working copy are reported as `Null`.
    pub fn changes(&self) -> BTreeMap<String, AttributeValue> {
        let (Some(working), Some(pristine)) = (&self.working, &self.pristine) else {
            return BTreeMap::new();
        };

        let mut changed: BTreeMap<String, AttributeValue> = working
            .attributes
            .iter()
            .filter(|(name, value)| pristine.get(name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for name in pristine.attributes.keys() {
            if !working.attributes.contains_key(name) {
                changed.insert(name.clone(), AttributeValue::Null);
            }
        }
        changed
    }

    /// Update payload: the original DN plus the changed attributes
    pub fn update_payload(&self) -> Option<DirectoryEntry> {
        let pristine = self.pristine.as_ref()?;
        Some(DirectoryEntry {
            dn: pristine.dn.clone(),
            attributes: self.changes(),
        })
    }

    /// Submit the changes and return to the issuer list.
    ///
    /// Without a loaded entry there is nothing to save and the view stays.
    pub async fn do_save(&self, ctx: &ViewContext) -> Result<Navigation> {
        let Some(payload) = self.update_payload() else {
            return Ok(Navigation::Stay);
        };
        debug!("Saving {} changed attributes of {}", payload.attributes.len(), payload.dn);
        ctx.mutate(Mutation::Update(vec![payload]), Route::Issuers).await
    }
}
