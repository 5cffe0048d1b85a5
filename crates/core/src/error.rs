use thiserror::Error;

use crate::model::{CardError, DeckError};
use crate::sample::SampleError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Sample(#[from] SampleError),
}
