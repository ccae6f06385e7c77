//! Workspace-level error aggregation.

use thiserror::Error;

/// Any error the facade surfaces, aggregated from the layer crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] merkex_tree::TreeError),

    #[error(transparent)]
    Envelope(#[from] merkex_envelope::EnvelopeError),

    #[error(transparent)]
    Exchange(#[from] merkex_exchange::ExchangeError),
}
