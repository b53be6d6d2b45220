use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use visita_shared::pii::redact_phone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
}

/// Directory lookup seam; backed by the tenant's customer table in
/// production and by a fixture map in tests.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_normalized_phone(
        &self,
        tenant_id: Uuid,
        normalized_phone: &str,
    ) -> Result<Vec<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl<D: CustomerDirectory + ?Sized> CustomerDirectory for std::sync::Arc<D> {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_normalized_phone(
        &self,
        tenant_id: Uuid,
        normalized_phone: &str,
    ) -> Result<Vec<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).find_by_normalized_phone(tenant_id, normalized_phone).await
    }
}

/// A non-authoritative match offered to the reception console for
/// pre-fill. Carries a redacted phone so the operator can confirm with
/// the guest without the console leaking the full number.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSuggestion {
    pub customer_id: Uuid,
    pub name: String,
    pub redacted_phone: String,
}

/// Outcome of two-tier customer resolution.
///
/// Only `Verified` carries a customer id that may flow into package
/// coverage; phone matches are suggestions for the operator to confirm,
/// never an identity grant.
#[derive(Debug, Clone, Serialize)]
pub enum CustomerResolution {
    Verified(Uuid),
    Suggestions(Vec<CustomerSuggestion>),
    Guest,
}

impl CustomerResolution {
    /// The id eligible for coverage resolution, if any.
    pub fn coverage_customer(&self) -> Option<Uuid> {
        match self {
            CustomerResolution::Verified(id) => Some(*id),
            _ => None,
        }
    }
}

pub struct CustomerResolver<D: CustomerDirectory> {
    directory: D,
}

impl<D: CustomerDirectory> CustomerResolver<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Resolve a customer reference. An explicit id is verified against
    /// the directory; absent that, a phone number yields best-effort
    /// suggestions only.
    pub async fn resolve(
        &self,
        tenant_id: Uuid,
        customer_id: Option<Uuid>,
        phone: Option<&str>,
    ) -> Result<CustomerResolution, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(id) = customer_id {
            return match self.directory.find_by_id(id).await? {
                Some(record) if record.tenant_id == tenant_id => {
                    Ok(CustomerResolution::Verified(record.id))
                }
                _ => {
                    tracing::warn!(customer_id = %id, "Unknown customer id on booking request, treating as guest");
                    Ok(CustomerResolution::Guest)
                }
            };
        }

        if let Some(raw) = phone {
            if let Some(normalized) = normalize_phone(raw) {
                let matches = self
                    .directory
                    .find_by_normalized_phone(tenant_id, &normalized)
                    .await?;
                if !matches.is_empty() {
                    let suggestions = matches
                        .into_iter()
                        .map(|record| CustomerSuggestion {
                            customer_id: record.id,
                            name: record.name,
                            redacted_phone: record
                                .phone
                                .as_deref()
                                .map(redact_phone)
                                .unwrap_or_default(),
                        })
                        .collect();
                    return Ok(CustomerResolution::Suggestions(suggestions));
                }
            }
        }

        Ok(CustomerResolution::Guest)
    }
}

/// Normalizes a phone number for heuristic matching: digits only,
/// international prefixes stripped, compared on the last 10 digits.
/// Returns None when too short to match meaningfully.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(stripped) = digits.strip_prefix("00") {
        digits = stripped.to_string();
    }
    if digits.len() < 7 {
        return None;
    }
    if digits.len() > 10 {
        digits = digits[digits.len() - 10..].to_string();
    }
    Some(digits)
}
