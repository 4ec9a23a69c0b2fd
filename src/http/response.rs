//! Error pages returned to clients when a request cannot be relayed.

/// Minimal HTML error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub code: u16,
    /// Short reason phrase for the status line
    pub reason: &'static str,
    /// Human-readable explanation
    pub message: &'static str,
    /// What triggered the error, usually echoed from the request
    pub cause: String,
}

impl ErrorPage {
    pub fn new(
        code: u16,
        reason: &'static str,
        message: &'static str,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            code,
            reason,
            message,
            cause: cause.into(),
        }
    }

    /// HTML body.
    pub fn body(&self) -> String {
        format!(
            "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
             {code}: {reason}\r\n\
             <p>{message}: {cause}\r\n\
             <hr><em>The Proxy Server</em>\r\n",
            code = self.code,
            reason = self.reason,
            message = self.message,
            cause = escape_html(&self.cause),
        )
    }

    /// Status line, headers and body, ready to write to the client.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.body();
        format!(
            "HTTP/1.0 {} {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n{}",
            self.code,
            self.reason,
            body.len(),
            body
        )
        .into_bytes()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
