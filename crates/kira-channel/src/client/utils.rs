use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::client::config::Config;
use crate::client::consts::AUTHORIZATION_HEADER;

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request = config.base_url().into_client_request()?;
    if let Some(token) = config.api_token() {
        request.headers_mut().insert(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", token.expose_secret()).as_str().parse()?,
        );
    }
    Ok(request)
}
