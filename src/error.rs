use thiserror::Error;

/// Failure kinds for the classification contract.
///
/// The three response-side kinds are deliberately distinct so callers can
/// tell "the model produced garbage" (`MalformedResponse`) from "the model
/// produced valid JSON that breaks the contract" (`SchemaViolation`) from
/// "we never got an answer at all" (`UpstreamUnavailable`). None of them are
/// ever replaced with placeholder data.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The response text does not contain exactly one parseable JSON object.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The JSON parsed but a field is missing, mistyped, or out of domain.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The model could not be reached or returned no content.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The uploaded image could not be decoded or is unusable.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl ClassifyError {
    /// Presentation-safe message for the UI layer. The detailed message stays
    /// in logs; users get a short actionable string.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClassifyError::MalformedResponse(_) => {
                "Unable to understand the AI response. Please try again."
            }
            ClassifyError::SchemaViolation(_) => {
                "The AI returned an unexpected answer. Please try again."
            }
            ClassifyError::UpstreamUnavailable(_) => {
                "The AI service is currently unavailable. Please try again later."
            }
            ClassifyError::InvalidImage(_) => {
                "That image could not be processed. Please upload a JPEG or PNG photo."
            }
        }
    }
}

impl From<ClassifyError> for String {
    fn from(err: ClassifyError) -> Self {
        err.to_string()
    }
}
