//! Transaction coordinator with post-commit hooks.
//!
//! ## Usage
//!
//! The callback runs inside a database transaction and returns a [`Committed`]
//! value. Hooks attached to it run on the same connection after the commit
//! succeeds, and never run when the transaction rolls back.
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use sharecal_db::db::transaction::{Committed, post_commit, with_transaction};
//!
//! let calendar = with_transaction(&mut conn, |tx| async move {
//!     let calendar = query::calendar::create_calendar(tx, &new_calendar).await?;
//!     let id = calendar.id;
//!     Ok(Committed::new(calendar).after_commit(post_commit(move |conn| {
//!         async move { seed(conn, id).await }.boxed()
//!     })))
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};
use futures::future::BoxFuture;

use crate::error::{DbError, DbResult};

/// Deferred action executed once the surrounding transaction has committed.
pub type PostCommitHook =
    Box<dyn for<'c> FnOnce(&'c mut AsyncPgConnection) -> BoxFuture<'c, DbResult<()>> + Send>;

/// ## Summary
/// Boxes a closure as a [`PostCommitHook`].
///
/// Exists so closure signatures are inferred against the higher-ranked bound.
pub fn post_commit<F>(hook: F) -> PostCommitHook
where
    F: for<'c> FnOnce(&'c mut AsyncPgConnection) -> BoxFuture<'c, DbResult<()>> + Send + 'static,
{
    Box::new(hook)
}

/// Result of a transaction body plus the hooks to run after it commits.
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub hooks: Vec<PostCommitHook>,
}

impl<T> Committed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            hooks: Vec::new(),
        }
    }

    pub fn after_commit(mut self, hook: PostCommitHook) -> Self {
        self.hooks.push(hook);
        self
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Committed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committed")
            .field("value", &self.value)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// ## Summary
/// Runs `callback` in a transaction, then runs the returned post-commit hooks
/// in order on the same connection.
///
/// ## Errors
/// Returns any error produced by the closure, errors raised while starting or
/// committing the transaction, or the first error returned by a hook. A hook
/// failure cannot undo the committed transaction; later hooks are skipped.
pub async fn with_transaction<'a, 'conn, T, E, F>(
    conn: &'conn mut AsyncPgConnection,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, Result<Committed<T>, E>>
        + Send
        + 'a,
    T: Send + 'a,
    E: From<diesel::result::Error> + From<DbError> + Send + 'a,
    'a: 'conn,
{
    let Committed { value, hooks } = conn.transaction::<_, E, _>(callback).await?;

    let total = hooks.len();
    for (index, hook) in hooks.into_iter().enumerate() {
        if let Err(error) = hook(conn).await {
            tracing::error!(%error, hook = index, total, "Post-commit hook failed");
            return Err(error.into());
        }
    }

    Ok(value)
}
