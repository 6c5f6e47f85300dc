// Installations owned by the logged-in account.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::Session;
use crate::error::Error;
use crate::graphql::catalog;

/// One physical installation reachable with this login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub giid: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub dealer_id: Option<String>,
    #[serde(default)]
    pub subsidiary: Option<String>,
    #[serde(default)]
    pub pin_code_length: Option<u32>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_number: Option<String>,
}

impl Session {
    /// Make `giid` the installation that giid-scoped operations target.
    pub fn set_active_installation(&mut self, giid: &str) -> Result<&Installation, Error> {
        let idx = self
            .installations
            .iter()
            .position(|inst| inst.giid == giid)
            .ok_or_else(|| Error::UnknownInstallation {
                giid: giid.to_owned(),
            })?;
        debug!(giid, "switching active installation");
        self.active = Some(idx);
        Ok(&self.installations[idx])
    }

    /// Fetch the account's installations and select the configured one.
    pub(super) async fn load_installations(&mut self) -> Result<(), Error> {
        let operation = self.build(&catalog::FETCH_ALL_INSTALLATIONS, &[])?;
        let mut data = self.send_batch(&[operation]).await?;
        let data = data.pop().unwrap_or(Value::Null);
        let installations = parse_installations(&data)?;

        if installations.is_empty() {
            return Err(Error::Login {
                message: "account has no installations".into(),
            });
        }
        if self.installation_index >= installations.len() {
            return Err(Error::Login {
                message: format!(
                    "installation index {} out of range ({} available)",
                    self.installation_index,
                    installations.len()
                ),
            });
        }

        self.active = Some(self.installation_index);
        self.installations = installations;
        Ok(())
    }
}

fn parse_installations(data: &Value) -> Result<Vec<Installation>, Error> {
    let list = data
        .pointer("/account/installations")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    serde_json::from_value(list).map_err(|e| Error::MalformedResponse {
        message: format!("installation list: {e}"),
        body: data.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_installation_list() {
        let data = json!({
            "account": {
                "installations": [{
                    "giid": "123456789",
                    "alias": "Home",
                    "customerType": "PRIVATE",
                    "dealerId": "1",
                    "subsidiary": "SE",
                    "pinCodeLength": 4,
                    "locale": "sv_SE",
                    "address": { "street": "Main 1", "city": "Malmo", "postalNumber": "21100", "__typename": "Address" },
                    "__typename": "Installation"
                }]
            }
        });

        let list = parse_installations(&data).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].giid, "123456789");
        assert_eq!(list[0].pin_code_length, Some(4));
        assert_eq!(
            list[0].address.as_ref().and_then(|a| a.postal_number.as_deref()),
            Some("21100")
        );
    }

    #[test]
    fn missing_list_is_empty() {
        assert!(parse_installations(&json!({ "account": null })).unwrap().is_empty());
    }

    #[test]
    fn entry_without_giid_is_malformed() {
        let data = json!({ "account": { "installations": [{ "alias": "x" }] } });
        assert!(matches!(
            parse_installations(&data),
            Err(Error::MalformedResponse { .. })
        ));
    }
}
