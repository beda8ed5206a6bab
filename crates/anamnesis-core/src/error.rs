use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown specialty: {0}")]
    UnknownSpecialty(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}
