use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::database::models::VoteStatus;
use crate::error::{Result, ReviewError};

/// A vote that has passed local checks and may be submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteIntent {
    /// Carries the captured signature as an image data URL.
    Approve { signature: String },
    Reject { comment: String },
}

impl VoteIntent {
    /// Approval needs a drawn signature.
    pub fn approve(signature: &str) -> Result<Self> {
        validate_signature(signature)?;
        Ok(VoteIntent::Approve {
            signature: signature.to_string(),
        })
    }

    /// Rejection needs a reason.
    pub fn reject(comment: &str) -> Result<Self> {
        if !can_confirm_rejection(comment) {
            return Err(ReviewError::ValidationError(
                "A comment is required to reject a proposal".to_string(),
            ));
        }
        Ok(VoteIntent::Reject {
            comment: comment.to_string(),
        })
    }

    pub fn vote_status(&self) -> VoteStatus {
        match self {
            VoteIntent::Approve { .. } => VoteStatus::Approve,
            VoteIntent::Reject { .. } => VoteStatus::Reject,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            VoteIntent::Approve { .. } => "",
            VoteIntent::Reject { comment } => comment,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            VoteIntent::Approve { signature } => Some(signature),
            VoteIntent::Reject { .. } => None,
        }
    }
}

/// Whether the reject confirmation may be enabled.
pub fn can_confirm_rejection(comment: &str) -> bool {
    !comment.trim().is_empty()
}

/// Accepts `data:image/<type>;base64,<payload>` with a non-empty payload.
pub fn validate_signature(data: &str) -> Result<()> {
    let missing = || ReviewError::ValidationError("A signature is required to approve".to_string());

    let rest = data.trim().strip_prefix("data:image/").ok_or_else(missing)?;
    let (_, payload) = rest.split_once(";base64,").ok_or_else(missing)?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ReviewError::ValidationError(format!("Malformed signature image: {}", e)))?;
    if bytes.is_empty() {
        return Err(missing());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_STUB: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_approve_requires_signature() {
        assert!(VoteIntent::approve(PNG_STUB).is_ok());
        assert!(VoteIntent::approve("").is_err());
        assert!(VoteIntent::approve("data:image/png;base64,").is_err());
        assert!(VoteIntent::approve("data:text/plain;base64,aGk=").is_err());
        assert!(VoteIntent::approve("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_reject_requires_comment() {
        assert!(!can_confirm_rejection("   "));
        assert!(VoteIntent::reject("\n").is_err());

        let intent = VoteIntent::reject("Budget is incomplete").unwrap();
        assert_eq!(intent.vote_status(), VoteStatus::Reject);
        assert_eq!(intent.comment(), "Budget is incomplete");
        assert_eq!(intent.signature(), None);
    }
}
