use thiserror::Error;

/// Why a material could not be turned into a fragment shader.
///
/// `stage` is `None` for material-wide fields (lighting, alpha test, texture bindings).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("material has no combiner stages")]
    NoStages,
    #[error("material has {count} combiner stages; the hardware supports at most {max}")]
    TooManyStages { count: usize, max: usize },
    #[error("unsupported combiner configuration{}: {field}: {detail}", stage_suffix(.stage))]
    Unsupported {
        stage: Option<usize>,
        field: &'static str,
        detail: String,
    },
    #[error("invalid material{}: {field}: {detail}", stage_suffix(.stage))]
    Invalid {
        stage: Option<usize>,
        field: &'static str,
        detail: String,
    },
}

fn stage_suffix(stage: &Option<usize>) -> String {
    match stage {
        Some(index) => format!(" (stage {index})"),
        None => String::new(),
    }
}

impl GenerateError {
    pub(crate) fn unsupported(
        stage: Option<usize>,
        field: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        GenerateError::Unsupported {
            stage,
            field,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(
        stage: Option<usize>,
        field: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        GenerateError::Invalid {
            stage,
            field,
            detail: detail.into(),
        }
    }

    /// Stage index the error refers to, if it is stage-specific.
    pub fn stage(&self) -> Option<usize> {
        match self {
            GenerateError::NoStages | GenerateError::TooManyStages { .. } => None,
            GenerateError::Unsupported { stage, .. } | GenerateError::Invalid { stage, .. } => {
                *stage
            }
        }
    }
}
