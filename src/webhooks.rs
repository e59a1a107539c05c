use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::apex;
use crate::client::RelayClient;
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::http::HttpClient;
use crate::rest::RestClient;

/// A webhook definition backed by a deployed relay trigger.
#[derive(Debug, Clone, Default)]
pub struct Webhook {
    /// Org-side id of the trigger artifact. Set on listed webhooks;
    /// required for deletion.
    pub id: Option<String>,
    /// User-facing name; deployed as the `ActionRelayTrigger<name>`
    /// artifact.
    pub name: String,
    /// Entity the trigger fires on, e.g. `Contact`.
    pub sobject: String,
    /// Callback URL the generated trigger posts change payloads to. Baked
    /// into the deployed body and not recoverable from a listing.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerRecord {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Body")]
    body: String,
}

#[derive(Debug, Deserialize)]
struct ClassRecord {
    #[serde(rename = "Id")]
    id: String,
}

/// Create payload for `sobjects/ApexClass`.
#[derive(Serialize)]
struct ApexClassArtifact<'a> {
    #[serde(rename = "ApiVersion")]
    api_version: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
}

/// Create payload for `sobjects/ApexTrigger`.
#[derive(Serialize)]
struct ApexTriggerArtifact<'a> {
    #[serde(rename = "ApiVersion")]
    api_version: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "TableEnumOrId")]
    table_enum_or_id: &'a str,
}

fn trigger_query() -> String {
    format!(
        "SELECT Id, Name, Body FROM ApexTrigger WHERE Name LIKE '{}%'",
        apex::TRIGGER_PREFIX
    )
}

fn class_query() -> String {
    format!(
        "SELECT Id FROM ApexClass WHERE Name = '{}'",
        apex::WEBHOOK_CLASS_NAME
    )
}

fn webhook_from_trigger(record: TriggerRecord) -> Result<Webhook, Error> {
    let sobject = apex::target_sobject(&record.body)
        .ok_or_else(|| Error::Decode {
            context: "trigger body",
            detail: format!("no target entity in {}", record.name),
        })?
        .to_string();
    let name = apex::strip_trigger_prefix(&record.name)
        .unwrap_or(&record.name)
        .to_string();

    Ok(Webhook {
        id: Some(record.id),
        name,
        sobject,
        url: None,
    })
}

impl<S: CredentialStore, H: HttpClient> RelayClient<'_, S, H> {
    /// Relay-managed webhooks currently deployed in the org.
    ///
    /// The trigger artifacts are the only storage: names are recovered by
    /// stripping the artifact prefix and target entities positionally from
    /// the trigger bodies.
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, Error> {
        let soql = trigger_query();
        let soql = soql.as_str();

        self.execute(move |credentials| async move {
            let rest = RestClient::new(self.http, &self.config.api_version, credentials);
            let page = rest.query::<TriggerRecord>(soql).await?;
            page.records.into_iter().map(webhook_from_trigger).collect()
        })
        .await
    }

    /// Deploy the artifacts for a webhook definition: the shared
    /// `ActionRelayWebhook` class when the org does not have it yet, and
    /// one `ActionRelayTrigger<name>` trigger.
    ///
    /// Safe to call when the class already exists; that half becomes a
    /// no-op. The existence check and the create are two separate calls,
    /// so two concurrent first-webhook deployments can both see the class
    /// as absent and the org rejects the loser's duplicate create.
    pub async fn create_webhook(&self, webhook: &Webhook) -> Result<(), Error> {
        if webhook.name.trim().is_empty() {
            return Err(Error::Validation { field: "name" });
        }
        if webhook.sobject.trim().is_empty() {
            return Err(Error::Validation { field: "sobject" });
        }

        let trigger_name = apex::trigger_name(&webhook.name);
        let trigger_body = apex::render_trigger(
            &webhook.name,
            &webhook.sobject,
            webhook.url.as_deref().unwrap_or(""),
        );
        let class_soql = class_query();

        let api_version = self.config.api_version_number();
        let trigger_name = trigger_name.as_str();
        let trigger_body = trigger_body.as_str();
        let class_soql = class_soql.as_str();
        let sobject = webhook.sobject.as_str();

        self.execute(move |credentials| async move {
            let rest = RestClient::new(self.http, &self.config.api_version, credentials);

            let existing = rest.query::<ClassRecord>(class_soql).await?;
            match existing.records.first() {
                Some(class) => debug!(class = %class.id, "webhook class already deployed"),
                None => {
                    rest.create(
                        "ApexClass",
                        &ApexClassArtifact {
                            api_version,
                            body: apex::class_body(),
                            name: apex::WEBHOOK_CLASS_NAME,
                        },
                    )
                    .await?;
                }
            }

            rest.create(
                "ApexTrigger",
                &ApexTriggerArtifact {
                    api_version,
                    body: trigger_body,
                    name: trigger_name,
                    table_enum_or_id: sobject,
                },
            )
            .await?;

            Ok(())
        })
        .await
    }

    /// Remove a webhook's trigger artifact by its stored id.
    ///
    /// The shared class stays in place; other webhooks may still call it.
    pub async fn delete_webhook(&self, webhook: &Webhook) -> Result<(), Error> {
        let Some(id) = webhook.id.as_deref() else {
            return Err(Error::Validation { field: "id" });
        };

        self.execute(move |credentials| async move {
            RestClient::new(self.http, &self.config.api_version, credentials)
                .delete("ApexTrigger", id)
                .await
        })
        .await
    }
}
