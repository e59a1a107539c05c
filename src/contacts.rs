use serde::{Deserialize, Serialize};

use crate::client::RelayClient;
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::http::HttpClient;
use crate::rest::RestClient;

/// Fixed field projection for contact reads.
const CONTACT_QUERY: &str = "SELECT Id, FirstName, LastName, Email, Phone FROM Contact";

/// A contact record. Read from and written to the org directly; nothing is
/// persisted locally.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Contact {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Phone", default)]
    pub phone: Option<String>,
}

/// The update payload. Only these fields may change through
/// [`RelayClient::update_contact`]; a `null` clears the org field, the same
/// as submitting an emptied form.
#[derive(Serialize)]
struct ContactChanges<'a> {
    #[serde(rename = "FirstName")]
    first_name: Option<&'a str>,
    #[serde(rename = "LastName")]
    last_name: Option<&'a str>,
    #[serde(rename = "Email")]
    email: Option<&'a str>,
    #[serde(rename = "Phone")]
    phone: Option<&'a str>,
}

impl<S: CredentialStore, H: HttpClient> RelayClient<'_, S, H> {
    /// All contacts in the org, with the fixed field projection. Returns
    /// one query page; orgs with more contacts than a page are truncated.
    pub async fn get_contacts(&self) -> Result<Vec<Contact>, Error> {
        self.execute(|credentials| async move {
            let rest = RestClient::new(self.http, &self.config.api_version, credentials);
            Ok(rest.query::<Contact>(CONTACT_QUERY).await?.records)
        })
        .await
    }

    /// Update the mutable fields of a contact, keyed by its id. Fields
    /// other than the four in the read projection are left untouched.
    pub async fn update_contact(&self, contact: &Contact) -> Result<(), Error> {
        if contact.id.is_empty() {
            return Err(Error::Validation { field: "id" });
        }

        let changes = ContactChanges {
            first_name: contact.first_name.as_deref(),
            last_name: contact.last_name.as_deref(),
            email: contact.email.as_deref(),
            phone: contact.phone.as_deref(),
        };
        let changes = &changes;
        let id = contact.id.as_str();

        self.execute(move |credentials| async move {
            RestClient::new(self.http, &self.config.api_version, credentials)
                .update("Contact", id, changes)
                .await
        })
        .await
    }
}
