// MyPages authentication
//
// Form login against Spring Security, followed by scraping the CSRF token
// from the start page. The web flow has no server-side logout.

use std::sync::LazyLock;

use regex::Regex;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::error::Error;
use crate::legacy::client::MyPagesClient;
use crate::transport::TransportRequest;
use crate::validate::{BodyFormat, Envelope};

const LOGIN_PATH: &str = "/j_spring_security_check";
const START_PATH: &str = "/uk/start.html";

static CSRF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"<input type="hidden" name="_csrf" value="(?P<csrf>.*?)" />"#).unwrap()
});

impl MyPagesClient {
    /// Log in with the form flow and fetch the CSRF token.
    ///
    /// A `{"status": ...}` answer other than `"ok"` fails with
    /// [`Error::Login`] carrying the backend's message, as does any other
    /// failure except maintenance.
    pub async fn login(&mut self) -> Result<(), Error> {
        self.clear();
        debug!(username = self.credentials.username(), "logging in to MyPages");

        let form = vec![
            ("j_username".to_owned(), self.credentials.username().to_owned()),
            (
                "j_password".to_owned(),
                self.credentials.password()?.expose_secret().to_owned(),
            ),
        ];
        let request = TransportRequest::post(LOGIN_PATH)
            .query(&[("locale", "en_GB")])
            .form(form);
        if let Err(e) = self
            .exchange(request, BodyFormat::Json, Envelope::Status)
            .await
        {
            self.clear();
            return Err(e.into_login_error());
        }

        match self.fetch_csrf().await {
            Ok(csrf) => {
                self.csrf = Some(csrf);
                self.logged_in = true;
                info!(installation = %self.installation, "logged in to MyPages");
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e.into_login_error())
            }
        }
    }

    /// Forget the local session. Never contacts the server.
    pub fn logout(&mut self) {
        self.clear();
        debug!("MyPages session cleared");
    }

    async fn fetch_csrf(&mut self) -> Result<String, Error> {
        let installation = self.installation.clone();
        let request = TransportRequest::get(START_PATH).query(&[("inst", installation.as_str())]);
        let page = self
            .exchange(request, BodyFormat::Text, Envelope::None)
            .await?;
        let page = page.as_str().unwrap_or_default();

        extract_csrf(page).ok_or_else(|| Error::MalformedResponse {
            message: "start page has no CSRF token".into(),
            body: page.to_owned(),
        })
    }
}

fn extract_csrf(page: &str) -> Option<String> {
    CSRF_REGEX
        .captures(page)
        .and_then(|caps| caps.name("csrf"))
        .map(|m| m.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_is_scraped_from_hidden_input() {
        let page = r#"<form><input type="hidden" name="_csrf" value="a1b2-c3" /></form>"#;
        assert_eq!(extract_csrf(page).as_deref(), Some("a1b2-c3"));
        assert_eq!(extract_csrf("<html></html>"), None);
    }
}
