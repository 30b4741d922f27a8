use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_USER_AGENT: &str = "BedrockLauncher/0.1.0";

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// Plain GET with a JSON body. Anything but `200 OK` is a `Network` error,
/// an undecodable body is a `BadResponse`.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> LauncherResult<T> {
    let raw = get_text(client, url).await?;
    serde_json::from_str(&raw).map_err(|e| LauncherError::BadResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Same status contract as [`get_json`], returning the raw body.
pub async fn get_text(client: &Client, url: &str) -> LauncherResult<String> {
    let resp = client.get(url).send().await?;

    let status = resp.status();
    if status != StatusCode::OK {
        return Err(LauncherError::Network {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn get_json_decodes_an_ok_body() {
        let server = serve(
            "/latest.json",
            ResponseTemplate::new(200).set_body_string(r#"{"release": "1.21"}"#),
        )
        .await;
        let client = build_http_client().unwrap();

        let body: BTreeMap<String, String> =
            get_json(&client, &format!("{}/latest.json", server.uri())).await.unwrap();
        assert_eq!(body["release"], "1.21");
    }

    #[tokio::test]
    async fn non_ok_status_is_a_network_error() {
        for status in [201, 204, 404, 503] {
            let server = serve("/listing", ResponseTemplate::new(status)).await;
            let client = build_http_client().unwrap();
            let url = format!("{}/listing", server.uri());

            match get_text(&client, &url).await {
                Err(LauncherError::Network { url: u, status: s }) => {
                    assert_eq!(u, url);
                    assert_eq!(s, status);
                }
                other => panic!("expected Network for {status}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_bad_response() {
        let server = serve("/listing", ResponseTemplate::new(200).set_body_string("<html>")).await;
        let client = build_http_client().unwrap();

        let result: LauncherResult<Vec<String>> =
            get_json(&client, &format!("{}/listing", server.uri())).await;
        assert!(matches!(result, Err(LauncherError::BadResponse { .. })));
    }
}
