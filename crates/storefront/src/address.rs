//! Default shipping address and its edit form.
//!
//! The default address is picked from the addresses that come with the
//! account cart. Edits happen on a separate form copy and only replace the
//! default when saved; saving is local, nothing is sent to the backend.

use std::str::FromStr;

use crate::error::ValidationError;
use crate::models::Address;

/// One editable field of the address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Street,
    City,
    State,
    PostalCode,
    Country,
}

impl FromStr for AddressField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "street" => Ok(Self::Street),
            "city" => Ok(Self::City),
            "state" => Ok(Self::State),
            "postalcode" | "pincode" | "zip" => Ok(Self::PostalCode),
            "country" => Ok(Self::Country),
            other => Err(format!("unknown address field: {other}")),
        }
    }
}

/// The cached default address plus the form being edited.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    default: Option<Address>,
    form: Address,
}

fn blank_form() -> Address {
    Address {
        is_default: true,
        ..Address::default()
    }
}

impl AddressBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default: None,
            form: blank_form(),
        }
    }

    /// Adopt the address flagged default among `saved`, if any.
    ///
    /// An empty list leaves a locally saved default in place.
    pub fn adopt_saved(&mut self, saved: &[Address]) {
        if let Some(default) = saved.iter().find(|address| address.is_default) {
            self.default = Some(default.clone());
            self.form = default.clone();
        }
    }

    #[must_use]
    pub const fn default_address(&self) -> Option<&Address> {
        self.default.as_ref()
    }

    #[must_use]
    pub const fn form(&self) -> &Address {
        &self.form
    }

    /// Start editing, prefilled from the default address.
    pub fn open_form(&mut self) {
        if let Some(default) = &self.default {
            self.form = default.clone();
        }
    }

    pub fn set_field(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AddressField::Street => self.form.street = value,
            AddressField::City => self.form.city = value,
            AddressField::State => self.form.state = value,
            AddressField::PostalCode => self.form.postal_code = value,
            AddressField::Country => self.form.country = value,
        }
    }

    /// Make the form the default address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingAddressFields` if any field is blank;
    /// the default address is left unchanged.
    pub fn save(&mut self) -> Result<&Address, ValidationError> {
        let missing = self.form.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingAddressFields(missing));
        }
        let mut saved = self.form.clone();
        saved.is_default = true;
        Ok(self.default.insert(saved))
    }

    /// Discard form edits.
    pub fn cancel(&mut self) {
        self.form = self.default.clone().unwrap_or_else(blank_form);
    }

    /// Forget everything (used on logout).
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
