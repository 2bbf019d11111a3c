// src/ingest/parser.rs
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::error::{FeedError, UpstreamError};
use crate::ingest::types::RawMessage;

#[derive(Debug, Deserialize)]
struct ResponseDoc {
    #[serde(default)]
    errors: Option<ErrorsBlock>,
    #[serde(rename = "feedMessageResponse", default)]
    feed_message_response: Option<FeedMessageBlock>,
}

#[derive(Debug, Deserialize)]
struct ErrorsBlock {
    #[serde(rename = "error", default)]
    entries: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl ErrorEntry {
    fn into_upstream(self) -> UpstreamError {
        let code = self.code.trim().to_string();
        let description = [self.description, self.text]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| code.clone());
        UpstreamError { code, description }
    }
}

#[derive(Debug, Deserialize)]
struct FeedMessageBlock {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    messages: Option<MessagesBlock>,
}

#[derive(Debug, Deserialize)]
struct MessagesBlock {
    #[serde(rename = "message", default)]
    entries: Vec<RawMessage>,
}

/// Element-level facts the serde model cannot tell apart (an absent block vs.
/// an empty one, and the name of the root element).
#[derive(Debug, Default)]
struct Outline {
    root: Option<String>,
    has_feed_block: bool,
}

fn outline(body: &str) -> Result<Outline, FeedError> {
    let mut reader = Reader::from_str(body);
    let mut out = Outline::default();
    let mut depth = 0usize;

    loop {
        let (name, opens) = match reader.read_event() {
            Ok(Event::Start(e)) => (local_name(e.local_name().as_ref()), true),
            Ok(Event::Empty(e)) => (local_name(e.local_name().as_ref()), false),
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => {
                return Err(FeedError::Parse(format!(
                    "malformed XML near byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        };

        match depth {
            0 if out.root.is_none() => out.root = Some(name),
            1 if name == "feedMessageResponse" => out.has_feed_block = true,
            _ => {}
        }
        if opens {
            depth += 1;
        }
    }

    Ok(out)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Parse a share's `latest.xml` body into raw messages, in document order.
///
/// Empty bodies, an empty `feedMessageResponse` and the `E-0195` error code all
/// mean "nothing to report" and yield an empty list. Any other upstream error
/// code fails with [`FeedError::Upstream`].
pub fn parse_feed(body: &str) -> Result<Vec<RawMessage>, FeedError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let t0 = std::time::Instant::now();

    let outline = outline(body)?;
    if outline.root.as_deref() != Some("response") {
        return Err(FeedError::Parse("response element not found".into()));
    }

    let doc: ResponseDoc = from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut no_messages = false;
    let mut unknown = Vec::new();
    for entry in doc.errors.map(|b| b.entries).unwrap_or_default() {
        let err = entry.into_upstream();
        if err.is_no_messages() {
            no_messages = true;
        } else {
            unknown.push(err);
        }
    }
    if !unknown.is_empty() {
        return Err(FeedError::Upstream(unknown));
    }
    if no_messages {
        tracing::info!("feed reports no messages");
        return Ok(Vec::new());
    }

    if !outline.has_feed_block {
        return Err(FeedError::Parse("feedMessageResponse not found".into()));
    }
    let Some(block) = doc.feed_message_response else {
        return Ok(Vec::new());
    };

    if let Some(count) = block.count.as_deref() {
        tracing::info!(count = count.trim(), "feed reports messages");
    }
    let messages = block.messages.map(|m| m.entries).unwrap_or_default();

    histogram!("spot_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("spot_messages_parsed_total").increment(messages.len() as u64);
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_MESSAGE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<response>
  <feedMessageResponse>
    <count>1</count>
    <feed>
      <id>0abcDEF123</id>
      <name>Ridge Team</name>
      <status>ACTIVE</status>
    </feed>
    <totalCount>1</totalCount>
    <activityCount>0</activityCount>
    <messages>
      <message clientUnixTime="0">
        <id>1700000001</id>
        <messengerId>0-2345678</messengerId>
        <messengerName>Ridge 1</messengerName>
        <unixTime>1757149200</unixTime>
        <messageType>TRACK</messageType>
        <latitude>40.01499</latitude>
        <longitude>-105.27055</longitude>
        <modelId>SPOT3</modelId>
        <showCustomMsg>Y</showCustomMsg>
        <dateTime>2025-09-06T09:00:00+0000</dateTime>
        <batteryState>GOOD</batteryState>
        <hidden>0</hidden>
        <altitude>1655</altitude>
      </message>
    </messages>
  </feedMessageResponse>
</response>"#;

    #[test]
    fn extracts_message_fields() {
        let msgs = parse_feed(ONE_MESSAGE).unwrap();
        assert_eq!(
            msgs,
            vec![RawMessage {
                messenger_name: "Ridge 1".into(),
                messenger_id: "0-2345678".into(),
                model_id: "SPOT3".into(),
                battery_state: "GOOD".into(),
                date_time: "2025-09-06T09:00:00+0000".into(),
                latitude: "40.01499".into(),
                longitude: "-105.27055".into(),
                altitude: "1655".into(),
            }]
        );
    }

    #[test]
    fn blank_body_is_empty() {
        assert!(parse_feed("").unwrap().is_empty());
        assert!(parse_feed("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn empty_feed_block_is_empty() {
        let xml = "<response><feedMessageResponse/></response>";
        assert!(parse_feed(xml).unwrap().is_empty());
        let xml = "<response><feedMessageResponse><count>0</count></feedMessageResponse></response>";
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn no_messages_code_is_benign() {
        let xml = r#"<response><errors><error>
            <code>E-0195</code>
            <text>No Messages to display</text>
            <description>No displayable messages found found for feed: 0abc</description>
        </error></errors></response>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn unknown_codes_fail_with_all_descriptions() {
        let xml = r#"<response><errors>
            <error><code>E-0160</code><text>Feed Not Found</text><description>Feed does not exist</description></error>
            <error><code>E-0195</code><description>No displayable messages</description></error>
            <error><code>E-0161</code><text>Private feed</text></error>
        </errors></response>"#;
        match parse_feed(xml) {
            Err(FeedError::Upstream(errs)) => {
                assert_eq!(errs.len(), 2);
                assert_eq!(errs[0].code, "E-0160");
                assert_eq!(errs[1].description, "Private feed");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        let msg = parse_feed(xml).unwrap_err().to_string();
        assert!(msg.contains("Feed does not exist,Private feed"));
    }

    #[test]
    fn structural_violations_are_parse_errors() {
        assert!(matches!(
            parse_feed("<html><body>maintenance</body></html>"),
            Err(FeedError::Parse(_))
        ));
        assert!(matches!(
            parse_feed("<response></response>"),
            Err(FeedError::Parse(ref m)) if m.contains("feedMessageResponse")
        ));
        assert!(matches!(
            parse_feed("<response><feedMessageResponse></response>"),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn missing_geometry_field_is_parse_error() {
        let xml = ONE_MESSAGE.replace("<latitude>40.01499</latitude>", "");
        assert!(matches!(parse_feed(&xml), Err(FeedError::Parse(_))));
    }
}
