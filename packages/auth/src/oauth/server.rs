// ABOUTME: Local callback listener for the OAuth authorization redirect
// ABOUTME: Binds before the browser opens and hands back the authorization code and state

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

/// Short-lived HTTP endpoint receiving the provider's redirect.
///
/// Binding happens in [`CallbackServer::bind`], before any URL is handed
/// to the browser, so the provider can always reach the callback.
pub struct CallbackServer {
    listener: TcpListener,
    port: u16,
}

impl CallbackServer {
    /// Bind the listener on localhost. Pass port 0 for an ephemeral port.
    pub async fn bind(port: u16) -> AuthResult<Self> {
        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::CallbackServer(format!("failed to bind to {addr}: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServer(format!("failed to resolve local addr: {e}")))?
            .port();

        info!("OAuth callback listener bound on 127.0.0.1:{port}");
        Ok(Self { listener, port })
    }

    /// The redirect URI the provider must be pointed at.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/auth/callback", self.port)
    }

    /// Wait for the provider's redirect and answer the browser.
    ///
    /// Consumes the server; the bound port is released when this future
    /// completes, whether the flow succeeded or failed.
    ///
    /// Returns (authorization_code, state).
    pub async fn wait_for_callback(self) -> AuthResult<(String, String)> {
        let (mut stream, peer_addr) = self.listener.accept().await.map_err(|e| {
            AuthError::CallbackServer(format!("failed to accept connection: {e}"))
        })?;
        debug!("received callback connection from {peer_addr}");

        let mut buffer = vec![0; 2048];
        let n = stream
            .read(&mut buffer)
            .await
            .map_err(|e| AuthError::CallbackServer(format!("failed to read request: {e}")))?;
        let request = String::from_utf8_lossy(&buffer[..n]).into_owned();

        let code = extract_query_param(&request, "code");
        let state = extract_query_param(&request, "state");

        match (code, state) {
            (Some(code), Some(state)) => {
                if let Err(e) = stream.write_all(success_response().as_bytes()).await {
                    debug!("failed to send success response: {e}");
                }
                info!("received authorization code");
                Ok((code, state))
            }
            _ => {
                if let Some(error) = extract_query_param(&request, "error") {
                    let _ = stream.write_all(error_response(&error).as_bytes()).await;
                    Err(AuthError::LoginFailed(format!("provider error: {error}")))
                } else {
                    let msg = "no authorization code in callback";
                    let _ = stream.write_all(error_response(msg).as_bytes()).await;
                    Err(AuthError::CallbackServer(msg.to_string()))
                }
            }
        }
    }
}

/// Pull one query parameter out of the request line of an HTTP request.
fn extract_query_param(request: &str, name: &str) -> Option<String> {
    let first_line = request.lines().next()?;
    for prefix in [format!("?{name}="), format!("&{name}=")] {
        if let Some(start) = first_line.find(&prefix) {
            let value = &first_line[start + prefix.len()..];
            let end = value.find(&['&', ' '][..]).unwrap_or(value.len());
            return Some(value[..end].to_string());
        }
    }
    None
}

fn success_response() -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        SUCCESS_HTML.len(),
        SUCCESS_HTML
    )
}

fn error_response(error_msg: &str) -> String {
    let html = format!(
        "<html><body><h1>Authentication Failed</h1><p>{error_msg}</p><p>You can close this tab and return to your terminal.</p></body></html>"
    );
    format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        html.len(),
        html
    )
}

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Authentication Successful</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #22c55e; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>Authentication Successful</h1>
    <p>You are logged in. You can close this tab and return to your terminal.</p>
</body>
</html>"#;
