use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LatexError {
    #[error("invalid LaTeX at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("text command {0} is missing its braced argument")]
    MissingArgument(String),
}

impl LatexError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            LatexError::Syntax { offset, .. } => Some(*offset),
            LatexError::MissingArgument(_) => None,
        }
    }
}
