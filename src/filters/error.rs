//! Error types for filter compilation.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid filter syntax in '{clause}': value list is missing a closing ')'")]
    UnclosedValueList { clause: String },

    #[error("invalid filter syntax in '{clause}': value list is empty")]
    EmptyValueList { clause: String },

    #[error("unrecognized filter clause '{clause}'")]
    UnrecognizedClause { clause: String },
}

pub type Result<T> = std::result::Result<T, FilterError>;
