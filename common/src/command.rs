use thiserror::Error;

use crate::slot::SlotId;
use crate::topics::{TOPIC_CMD_GATE_CLOSE, TOPIC_CMD_GATE_OPEN, TOPIC_CMD_INDICATOR};
use crate::types::{GateCommandPayload, IndicatorCommandPayload};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("slot number {0} out of range")]
    SlotOutOfRange(u8),
    #[error("unknown gate action {0:?}")]
    UnknownAction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    Open,
    Close,
}

/// A validated inbound control command. Manual overrides bypass the
/// reservation tracker entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetIndicator { on: bool },
    Gate { slot: SlotId, action: GateAction },
}

/// Decodes one inbound bus message into a command.
///
/// `Ok(None)` means the topic is not a command topic and the message should
/// be ignored. Any `Err` is logged and the message dropped; inbound commands
/// are transient control signals, never retried.
pub fn decode(topic: &str, payload: &[u8]) -> Result<Option<Command>, DecodeError> {
    match topic {
        TOPIC_CMD_GATE_OPEN => decode_gate(payload, GateAction::Open).map(Some),
        TOPIC_CMD_GATE_CLOSE => decode_gate(payload, GateAction::Close).map(Some),
        TOPIC_CMD_INDICATOR => decode_indicator(payload).map(Some),
        _ => Ok(None),
    }
}

fn decode_gate(payload: &[u8], topic_action: GateAction) -> Result<Command, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let parsed: GateCommandPayload = serde_json::from_str(text)?;

    let slot =
        SlotId::new(parsed.slot_number).ok_or(DecodeError::SlotOutOfRange(parsed.slot_number))?;

    // The action field may be omitted; the topic then decides.
    let action = match parsed.command.as_deref() {
        None => topic_action,
        Some("open") => GateAction::Open,
        Some("close") => GateAction::Close,
        Some(other) => return Err(DecodeError::UnknownAction(other.to_string())),
    };

    Ok(Command::Gate { slot, action })
}

fn decode_indicator(payload: &[u8]) -> Result<Command, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let parsed: IndicatorCommandPayload = serde_json::from_str(text)?;

    let on = parsed.state.as_deref() == Some("on") || parsed.on == Some(true);
    Ok(Command::SetIndicator { on })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn gate_open_topic_decodes() {
        let cmd = decode(TOPIC_CMD_GATE_OPEN, br#"{"slotNumber":2,"command":"open"}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            cmd,
            Command::Gate {
                slot: slot(2),
                action: GateAction::Open,
            }
        );
    }

    #[test]
    fn missing_command_field_defaults_from_topic() {
        let cmd = decode(TOPIC_CMD_GATE_CLOSE, br#"{"slotNumber":1}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            cmd,
            Command::Gate {
                slot: slot(1),
                action: GateAction::Close,
            }
        );
    }

    #[test]
    fn explicit_command_overrides_topic_default() {
        let cmd = decode(TOPIC_CMD_GATE_OPEN, br#"{"slotNumber":3,"command":"close"}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            cmd,
            Command::Gate {
                slot: slot(3),
                action: GateAction::Close,
            }
        );
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let err = decode(TOPIC_CMD_GATE_OPEN, br#"{"slotNumber":5,"command":"open"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::SlotOutOfRange(5)));

        let err = decode(TOPIC_CMD_GATE_OPEN, br#"{"slotNumber":0}"#).unwrap_err();
        assert!(matches!(err, DecodeError::SlotOutOfRange(0)));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err =
            decode(TOPIC_CMD_GATE_OPEN, br#"{"slotNumber":1,"command":"wiggle"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAction(_)));
    }

    #[test]
    fn malformed_json_is_an_error_not_a_panic() {
        assert!(matches!(
            decode(TOPIC_CMD_GATE_OPEN, b"{not json"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode(TOPIC_CMD_INDICATOR, &[0xff, 0xfe]),
            Err(DecodeError::NotUtf8)
        ));
    }

    #[test]
    fn indicator_accepts_both_payload_shapes() {
        let on = decode(TOPIC_CMD_INDICATOR, br#"{"state":"on"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(on, Command::SetIndicator { on: true });

        let on = decode(TOPIC_CMD_INDICATOR, br#"{"on":true}"#).unwrap().unwrap();
        assert_eq!(on, Command::SetIndicator { on: true });

        let off = decode(TOPIC_CMD_INDICATOR, br#"{"state":"off"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(off, Command::SetIndicator { on: false });
    }

    #[test]
    fn unrelated_topics_are_ignored() {
        assert!(decode("parking/slot/1/status", b"{}").unwrap().is_none());
        assert!(decode("some/other/topic", b"junk").unwrap().is_none());
    }
}
