//! Wire frames exchanged with the bridge sidecar.

use {
    pesan_channels::{InboundMessage, TransportEvent},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

#[derive(Debug, Serialize)]
pub struct BridgeRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<BridgeErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    Qr {
        code: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default)]
        message: Option<String>,
    },
    Disconnected {
        #[serde(default)]
        reason: Option<String>,
    },
    Message {
        from: String,
        body: String,
    },
}

impl From<BridgeEvent> for TransportEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::Qr { code } => Self::PairingCodeIssued { code },
            BridgeEvent::Authenticated => Self::Authenticated,
            BridgeEvent::Ready => Self::Ready,
            BridgeEvent::AuthFailure { message } => Self::AuthFailed { reason: message },
            BridgeEvent::Disconnected { reason } => Self::Disconnected { reason },
            BridgeEvent::Message { from, body } => {
                Self::MessageReceived(InboundMessage { from, body })
            },
        }
    }
}

/// Any line the bridge writes to stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BridgeFrame {
    Response(BridgeResponse),
    Event(BridgeEvent),
}

impl BridgeFrame {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_params() {
        let req = BridgeRequest {
            id: 7,
            method: "logout",
            params: None,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"id":7,"method":"logout"}"#
        );
    }

    #[test]
    fn parses_success_and_error_responses() {
        let BridgeFrame::Response(ok) =
            BridgeFrame::parse(r#"{"id":1,"result":{"id":"wamid.1"}}"#).unwrap()
        else {
            panic!("expected response");
        };
        assert_eq!(ok.id, 1);
        assert_eq!(ok.result.unwrap()["id"], "wamid.1");
        assert!(ok.error.is_none());

        let BridgeFrame::Response(err) =
            BridgeFrame::parse(r#"{"id":2,"error":{"message":"no such chat"}}"#).unwrap()
        else {
            panic!("expected response");
        };
        assert_eq!(err.error.unwrap().message, "no such chat");
    }

    #[test]
    fn parses_lifecycle_events() {
        let cases = [
            (
                r#"{"event":"qr","code":"2@abc"}"#,
                TransportEvent::PairingCodeIssued {
                    code: "2@abc".into(),
                },
            ),
            (r#"{"event":"authenticated"}"#, TransportEvent::Authenticated),
            (r#"{"event":"ready"}"#, TransportEvent::Ready),
            (
                r#"{"event":"auth_failure","message":"restore failed"}"#,
                TransportEvent::AuthFailed {
                    reason: Some("restore failed".into()),
                },
            ),
            (
                r#"{"event":"disconnected"}"#,
                TransportEvent::Disconnected { reason: None },
            ),
        ];
        for (line, expected) in cases {
            let BridgeFrame::Event(ev) = BridgeFrame::parse(line).unwrap() else {
                panic!("expected event for {line}");
            };
            assert_eq!(TransportEvent::from(ev), expected);
        }
    }

    #[test]
    fn parses_inbound_message() {
        let BridgeFrame::Event(ev) =
            BridgeFrame::parse(r#"{"event":"message","from":"62811@c.us","body":"P"}"#).unwrap()
        else {
            panic!("expected event");
        };
        assert_eq!(
            TransportEvent::from(ev),
            TransportEvent::MessageReceived(InboundMessage {
                from: "62811@c.us".into(),
                body: "P".into(),
            })
        );
    }

    #[test]
    fn rejects_unknown_frames() {
        assert!(BridgeFrame::parse(r#"{"event":"battery","level":3}"#).is_err());
        assert!(BridgeFrame::parse("not json").is_err());
    }
}
