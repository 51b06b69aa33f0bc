use crate::{
    Result,
    constants::{LABEL_RETURN, LABEL_TAKE, MAX_POSITION_ID_LENGTH},
    error::Error,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tool position on the panel (e.g. "1", "A3").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionId(String);

impl PositionId {
    /// Create a new position id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPosition` if the id is empty, longer than
    /// `MAX_POSITION_ID_LENGTH`, or contains non-ASCII or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() || id.len() > MAX_POSITION_ID_LENGTH {
            return Err(Error::InvalidPosition(format!(
                "length must be 1-{MAX_POSITION_ID_LENGTH}, got {}",
                id.len()
            )));
        }

        if !id.chars().all(|c| c.is_ascii_graphic()) {
            return Err(Error::InvalidPosition(format!(
                "must be printable ASCII: {id:?}"
            )));
        }

        Ok(PositionId(id))
    }

    /// Get the position id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PositionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PositionId::new(s)
    }
}

impl TryFrom<String> for PositionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PositionId::new(value)
    }
}

impl From<PositionId> for String {
    fn from(value: PositionId) -> Self {
        value.0
    }
}

/// What happened at a tool position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// The tool left its position.
    Take,
    /// The tool came back to its position.
    Return,
}

impl OperationKind {
    /// Label the authorization service expects for this operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use toolpanel_core::OperationKind;
    ///
    /// assert_eq!(OperationKind::Take.label(), "Retirada");
    /// assert_eq!(OperationKind::Return.label(), "Devolução");
    /// ```
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::Take => LABEL_TAKE,
            OperationKind::Return => LABEL_RETURN,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationKind::Take => write!(f, "take"),
            OperationKind::Return => write!(f, "return"),
        }
    }
}

/// Snapshot of a sensor channel at the moment an edge was recognized.
///
/// Events are moved by value from the sensing loop into the mailbox, so the
/// consumer never shares state with the channel that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Position whose sensor changed.
    pub position: PositionId,

    /// Whether the tool was taken or returned.
    pub kind: OperationKind,

    /// Outcome computed by the sensing loop for this poll.
    pub success: bool,

    /// Wall-clock time of the poll that recognized the edge.
    pub observed_at: DateTime<Local>,
}

impl SensorEvent {
    /// Create a successful event observed now.
    #[must_use]
    pub fn new(position: PositionId, kind: OperationKind) -> Self {
        Self {
            position,
            kind,
            success: true,
            observed_at: Local::now(),
        }
    }
}

impl fmt::Display for SensorEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at position {} ({})",
            self.kind,
            self.position,
            self.observed_at.format("%d/%m/%Y %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1")]
    #[case("A3")]
    #[case("shelf-12")]
    fn test_position_id_valid(#[case] id: &str) {
        let position = PositionId::new(id).unwrap();
        assert_eq!(position.as_str(), id);
        assert_eq!(position.to_string(), id);
    }

    #[rstest]
    #[case("")]
    #[case("with space")]
    #[case("posição")]
    #[case("12345678901234567")]
    fn test_position_id_invalid(#[case] id: &str) {
        assert!(matches!(
            PositionId::new(id),
            Err(Error::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_position_id_from_str() {
        let position: PositionId = "2".parse().unwrap();
        assert_eq!(position.as_str(), "2");
    }

    #[test]
    fn test_position_id_serde_validates() {
        let position: PositionId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(position.as_str(), "3");
        assert!(serde_json::from_str::<PositionId>("\"\"").is_err());
    }

    #[rstest]
    #[case(OperationKind::Take, "Retirada")]
    #[case(OperationKind::Return, "Devolução")]
    fn test_operation_label(#[case] kind: OperationKind, #[case] label: &str) {
        assert_eq!(kind.label(), label);
    }

    #[test]
    fn test_sensor_event_new_is_successful() {
        let event = SensorEvent::new(PositionId::new("1").unwrap(), OperationKind::Take);
        assert!(event.success);
        assert_eq!(event.kind, OperationKind::Take);
        assert!(event.to_string().starts_with("take at position 1"));
    }
}
