use crate::error::FailureReason;

/// Terminal value of one QR decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Payload bytes recovered from the symbol
    Success {
        /// Decoded segment data, concatenated
        payload: Vec<u8>,
    },
    /// Decoding stopped at a specific stage
    Failure {
        /// Which stage gave up, and why
        reason: FailureReason,
    },
}

impl DecodeOutcome {
    /// Shorthand for a failure outcome
    pub fn failure(reason: FailureReason) -> Self {
        DecodeOutcome::Failure { reason }
    }

    /// Payload on success
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            DecodeOutcome::Success { payload } => Some(payload),
            DecodeOutcome::Failure { .. } => None,
        }
    }

    /// Payload as text: UTF-8 when valid, otherwise ISO-8859-1 (the symbol default)
    pub fn text(&self) -> Option<String> {
        self.payload().map(|bytes| match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        })
    }
}

impl From<Result<Vec<u8>, FailureReason>> for DecodeOutcome {
    fn from(result: Result<Vec<u8>, FailureReason>) -> Self {
        match result {
            Ok(payload) => DecodeOutcome::Success { payload },
            Err(reason) => DecodeOutcome::Failure { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_falls_back_to_latin1() {
        let outcome = DecodeOutcome::Success {
            payload: vec![b'c', 0xE9],
        };
        assert_eq!(outcome.text().as_deref(), Some("cé"));
    }

    #[test]
    fn test_failure_has_no_payload() {
        let outcome = DecodeOutcome::failure(FailureReason::TimingMismatch);
        assert!(outcome.payload().is_none());
        assert!(outcome.text().is_none());
    }
}
