use lotto_db::models::DrawError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("tirage invalide : {0}")]
    InvalidDraw(#[from] DrawError),

    #[error("données insuffisantes : aucun tirage à analyser")]
    InsufficientData,

    #[error("génération épuisée : {generated}/{requested} combinaisons après {attempts} tentatives")]
    GenerationExhausted {
        attempts: usize,
        generated: usize,
        requested: usize,
    },
}
