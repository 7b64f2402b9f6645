//! HTML pages for `/` and `/qr`.

use pesan_sessions::{PairingArtifact, SessionStatus};

const BODY_STYLE: &str = "display: flex; flex-direction: column; align-items: center; \
                          justify-content: center; height: 100vh; font-family: Arial, sans-serif;";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(heading: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>WhatsApp QR Code</title>
    </head>
    <body style="{BODY_STYLE}">
        <h1>{heading}</h1>
{content}
    </body>
</html>
"#
    )
}

/// Landing page: usage help plus the current session status.
pub fn status_page(status: &SessionStatus, public_url: &str) -> String {
    let (label, color) = if status.authenticated {
        ("Authenticated", "green")
    } else {
        ("Not Authenticated", "red")
    };
    let example = format!(
        "curl -X GET {}/send-message?phoneNumber=6281234567***&message=Hello%20from%20the%20server",
        escape_html(public_url.trim_end_matches('/'))
    );
    let content = format!(
        r#"        <p>This server links a WhatsApp account and sends messages through it.</p>
        <p>Open <a href="/qr">/qr</a> and scan the code with WhatsApp on your phone to link this server.</p>
        <p>Once linked, send a message with the <code>/send-message</code> endpoint, for example:</p>
        <pre>{example}</pre>
        <p>Send <code>P</code> to the linked number to check that the server is active.</p>
        <p style="font-weight: bold">Current Status: <span style="color: {color};">{label}</span></p>
        <p>Session: <code>{state}</code></p>"#,
        state = status.state,
    );
    page("WhatsApp QR Code", &content)
}

/// Pairing page, or the "not available" page when no code is pending.
pub fn qr_page(artifact: Option<&PairingArtifact>) -> String {
    let Some(artifact) = artifact else {
        return page(
            "QR Code Not Available",
            "        <p>Please wait for the QR code to be generated, or refresh if the client is \
             not ready yet.</p>",
        );
    };

    let code = match artifact.image_data_url() {
        Some(url) => format!(
            r#"        <img src="{}" alt="QR Code" style="width: 300px; height: 300px;"/>"#,
            escape_html(url)
        ),
        None => format!(
            "        <pre>{}</pre>",
            escape_html(artifact.code())
        ),
    };
    let content = format!(
        "{code}\n        <p>Open WhatsApp on your phone and scan this code to login.</p>"
    );
    page("Scan QR Code to Login", &content)
}
