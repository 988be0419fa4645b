//! Shipping address, buyer type and payment method.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use bazaar_core::error::DomainError;
use bazaar_shipping::domain::policy::Destination;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Country assumed when the address does not name one.
pub const DEFAULT_COUNTRY: &str = "RO";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Whether the buyer is a natural person or a legal entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    /// Natural person (persoană fizică).
    #[default]
    PF,
    /// Legal entity (persoană juridică).
    PJ,
}

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Online card payment through the payment collaborator.
    Card,
    /// Cash on delivery.
    Cod,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card => f.write_str("CARD"),
            Self::Cod => f.write_str("COD"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARD" => Ok(Self::Card),
            "COD" => Ok(Self::Cod),
            other => Err(DomainError::Validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    /// Ten-digit phone number.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// County.
    pub county: String,
    /// City.
    pub city: String,
    /// Street and number.
    pub street: String,
    /// ISO country code, `RO` when absent.
    #[serde(default)]
    pub country: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Parcel locker chosen for delivery.
    #[serde(default)]
    pub locker_id: Option<String>,
    /// Company name, for legal-entity buyers.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Company tax identifier.
    #[serde(default)]
    pub tax_id: Option<String>,
    /// Trade registry number.
    #[serde(default)]
    pub registration_number: Option<String>,
}

fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl ShippingAddress {
    /// The customer type implied by the address: `PJ` when any company field
    /// is filled in.
    #[must_use]
    pub fn customer_type(&self) -> CustomerType {
        if present(self.company_name.as_ref())
            || present(self.tax_id.as_ref())
            || present(self.registration_number.as_ref())
        {
            CustomerType::PJ
        } else {
            CustomerType::PF
        }
    }

    /// Country code, defaulting to `RO`.
    #[must_use]
    pub fn country_code(&self) -> &str {
        self.country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }

    /// The pricing-relevant part of the address.
    #[must_use]
    pub fn destination(&self) -> Destination {
        Destination {
            country: Some(self.country_code().to_owned()),
            county: self.county.clone(),
            locker_id: self.locker_id.clone(),
        }
    }

    /// Validates the address for the requested customer type and returns a
    /// trimmed copy.
    ///
    /// Checks run in a fixed order: required fields, phone, email, company.
    ///
    /// # Errors
    ///
    /// Returns `AddressInvalid`, `PhoneInvalid`, `EmailInvalid` or
    /// `CompanyInvalid` for the first failing check.
    pub fn validate(self, requested: CustomerType) -> Result<Self, DomainError> {
        let address = Self {
            name: self.name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            email: self.email.trim().to_owned(),
            county: self.county.trim().to_owned(),
            city: self.city.trim().to_owned(),
            street: self.street.trim().to_owned(),
            country: trimmed(self.country).map(|c| c.to_ascii_uppercase()),
            postal_code: trimmed(self.postal_code),
            locker_id: trimmed(self.locker_id),
            company_name: trimmed(self.company_name),
            tax_id: trimmed(self.tax_id),
            registration_number: trimmed(self.registration_number),
        };

        let missing: Vec<&str> = [
            ("name", &address.name),
            ("county", &address.county),
            ("city", &address.city),
            ("street", &address.street),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::AddressInvalid(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !PHONE_RE.is_match(&address.phone) {
            return Err(DomainError::PhoneInvalid(
                "phone must be exactly 10 digits".to_owned(),
            ));
        }

        if !EMAIL_RE.is_match(&address.email) {
            return Err(DomainError::EmailInvalid(format!(
                "{} is not a valid email address",
                address.email
            )));
        }

        if requested == CustomerType::PJ
            && (address.company_name.is_none() || address.tax_id.is_none())
        {
            return Err(DomainError::CompanyInvalid(
                "legal-entity buyers must provide company name and tax id".to_owned(),
            ));
        }

        Ok(address)
    }
}
