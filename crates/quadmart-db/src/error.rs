pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-level error taxonomy. Handlers map these onto HTTP statuses;
/// the checkout variants carry the exact message text callers key off.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("No sellable items in your cart")]
    NoSellableItems,

    /// A joined row that referential integrity says must exist is missing,
    /// or stored data fails to parse. Logged and surfaced as a generic 500.
    #[error("data integrity fault: {0}")]
    Integrity(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}
