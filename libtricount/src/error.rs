#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("alpha must lie strictly between 0 and 1, got {0}")]
    AlphaOutOfRange(f64),
    #[error("beta must lie strictly between 0 and 1, got {0}")]
    BetaOutOfRange(f64),
    #[error("the memory budget must be positive")]
    EmptyBudget,
    #[error(
        "budget {k} leaves an empty partition (waiting room {w}, heavy {h}, reservoir {s})"
    )]
    BudgetTooSmall {
        k: usize,
        w: usize,
        h: usize,
        s: usize,
    },
}
