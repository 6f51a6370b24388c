use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("{function}() takes {expected} argument(s) ({found} given)")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },
    #[error("operands could not be broadcast together (lengths {left} and {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("{0}")]
    Type(String),
    #[error("cannot use '{name}': {message}")]
    Reference { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ExprError>;

impl ExprError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub fn reference(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Reference {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
