//! Message types and payload grammars for the peer protocol
//!
//! Every frame's payload is a single line of whitespace-separated ASCII
//! fields (the one exception being `INFR`, whose argument after the model
//! name is itself a JSON document). Parsing failures are never fatal to the
//! connection: a handler that fails to parse its payload replies with a
//! single `ERRO` frame and closes, per the protocol's validation rule.

use crate::error::{Error, Result};

/// Liveness probe. No arguments; replied to with `REPL "Pong"`.
pub const PING: &str = "PING";
/// Identity probe. No arguments; replied to with `REPL <peer-id>`.
pub const NAME: &str = "NAME";
/// Directory dump request. No arguments.
pub const LIST: &str = "LIST";
/// Join request: `<peer-id> <host> <port>`.
pub const JOIN: &str = "JOIN";
/// Leave notification: `<peer-id>`.
pub const QUIT: &str = "QUIT";
/// Model lookup: `<origin-id> <origin-host> <origin-port> <model> <ttl>`.
pub const QUER: &str = "QUER";
/// Model lookup result: `<model> <owner-id> <owner-host> <owner-port>`.
pub const RESP: &str = "RESP";
/// Inference request: `<model> <json input, to end of payload>`.
pub const INFR: &str = "INFR";
/// Generic success reply. Argument is free text.
pub const REPL: &str = "REPL";
/// Generic failure reply. Argument is free text.
pub const ERRO: &str = "ERRO";

/// Split a payload into exactly `n` whitespace-separated fields, erroring
/// if there are too few or too many.
fn split_fields<'a>(payload: &'a str, n: usize, msg_type: &str) -> Result<Vec<&'a str>> {
    let fields: Vec<&str> = payload.split_whitespace().collect();
    if fields.len() != n {
        return Err(Error::protocol_parse(format!(
            "{}: expected {} fields, got {}",
            msg_type,
            n,
            fields.len()
        )));
    }
    Ok(fields)
}

fn parse_port(s: &str, msg_type: &str) -> Result<u16> {
    s.parse::<u16>()
        .map_err(|_| Error::protocol_parse(format!("{}: invalid port {:?}", msg_type, s)))
}

fn parse_ttl(s: &str, msg_type: &str) -> Result<u32> {
    s.parse::<u32>()
        .map_err(|_| Error::protocol_parse(format!("{}: invalid ttl {:?}", msg_type, s)))
}

/// `JOIN <peer-id> <host> <port>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPayload {
    pub peer_id: String,
    pub host: String,
    pub port: u16,
}

impl JoinPayload {
    pub fn parse(payload: &str) -> Result<Self> {
        let f = split_fields(payload, 3, JOIN)?;
        Ok(Self {
            peer_id: f[0].to_string(),
            host: f[1].to_string(),
            port: parse_port(f[2], JOIN)?,
        })
    }

    pub fn to_wire(&self) -> String {
        format!("{} {} {}", self.peer_id, self.host, self.port)
    }
}

/// `QUIT <peer-id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuitPayload {
    pub peer_id: String,
}

impl QuitPayload {
    pub fn parse(payload: &str) -> Result<Self> {
        let f = split_fields(payload, 1, QUIT)?;
        Ok(Self {
            peer_id: f[0].to_string(),
        })
    }

    pub fn to_wire(&self) -> String {
        self.peer_id.clone()
    }
}

/// `QUER <origin-id> <origin-host> <origin-port> <model> <ttl>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPayload {
    pub origin_id: String,
    pub origin_host: String,
    pub origin_port: u16,
    pub model: String,
    pub ttl: u32,
}

impl QueryPayload {
    pub fn parse(payload: &str) -> Result<Self> {
        let f = split_fields(payload, 5, QUER)?;
        Ok(Self {
            origin_id: f[0].to_string(),
            origin_host: f[1].to_string(),
            origin_port: parse_port(f[2], QUER)?,
            model: f[3].to_string(),
            ttl: parse_ttl(f[4], QUER)?,
        })
    }

    pub fn to_wire(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.origin_id, self.origin_host, self.origin_port, self.model, self.ttl
        )
    }
}

/// `RESP <model> <owner-id> <owner-host> <owner-port>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    pub model: String,
    pub owner_id: String,
    pub host: String,
    pub port: u16,
}

impl ResponsePayload {
    pub fn parse(payload: &str) -> Result<Self> {
        let f = split_fields(payload, 4, RESP)?;
        Ok(Self {
            model: f[0].to_string(),
            owner_id: f[1].to_string(),
            host: f[2].to_string(),
            port: parse_port(f[3], RESP)?,
        })
    }

    pub fn to_wire(&self) -> String {
        format!("{} {} {} {}", self.model, self.owner_id, self.host, self.port)
    }
}

/// `INFR <model> <json input>` — everything after the first run of
/// whitespace is the input document, so the JSON itself may contain spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferPayload {
    pub model: String,
    pub input_json: String,
}

impl InferPayload {
    pub fn parse(payload: &str) -> Result<Self> {
        let trimmed = payload.trim_start();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let model = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::protocol_parse("INFR: missing model name"))?;
        let input_json = parts
            .next()
            .ok_or_else(|| Error::protocol_parse("INFR: missing input payload"))?
            .trim_start();
        if input_json.is_empty() {
            return Err(Error::protocol_parse("INFR: missing input payload"));
        }
        Ok(Self {
            model: model.to_string(),
            input_json: input_json.to_string(),
        })
    }

    pub fn to_wire(&self) -> String {
        format!("{} {}", self.model, self.input_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_round_trips() {
        let p = JoinPayload {
            peer_id: "peer-a".into(),
            host: "10.0.0.1".into(),
            port: 9000,
        };
        let parsed = JoinPayload::parse(&p.to_wire()).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn join_rejects_wrong_field_count() {
        assert!(JoinPayload::parse("only-one-field").is_err());
        assert!(JoinPayload::parse("a b c d").is_err());
    }

    #[test]
    fn join_rejects_bad_port() {
        assert!(JoinPayload::parse("peer-a 10.0.0.1 not-a-port").is_err());
    }

    #[test]
    fn query_round_trips() {
        let p = QueryPayload {
            origin_id: "peer-a".into(),
            origin_host: "10.0.0.1".into(),
            origin_port: 9000,
            model: "sentiment".into(),
            ttl: 3,
        };
        let parsed = QueryPayload::parse(&p.to_wire()).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn response_round_trips() {
        let p = ResponsePayload {
            model: "sentiment".into(),
            owner_id: "peer-b".into(),
            host: "10.0.0.2".into(),
            port: 9001,
        };
        let parsed = ResponsePayload::parse(&p.to_wire()).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn infer_round_trips_with_nested_whitespace() {
        let p = InferPayload {
            model: "sentiment".into(),
            input_json: r#"{"text": "hello world"}"#.into(),
        };
        let parsed = InferPayload::parse(&p.to_wire()).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn infer_rejects_missing_input() {
        assert!(InferPayload::parse("sentiment").is_err());
        assert!(InferPayload::parse("").is_err());
    }

    #[test]
    fn quit_round_trips() {
        let p = QuitPayload {
            peer_id: "peer-a".into(),
        };
        let parsed = QuitPayload::parse(&p.to_wire()).unwrap();
        assert_eq!(p, parsed);
    }
}
