pub mod macros;

/// Build an API model from a stored row.
pub trait FromEntity<E>: Sized {
    fn from_entity(entity: &E) -> Self;
}

/// Turn a create request into an active model ready for insertion.
/// The primary key stays `NotSet` so the database assigns it.
pub trait ToActiveModel<A> {
    fn to_active_model(&self) -> A;
}
