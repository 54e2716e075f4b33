use anyhow::Error;
use sqlx::PgConnection;

/// Entry point for acquiring handles to systems outside the app, such as the database.
/// Code which needs external access accepts an implementation of this trait so unit tests
/// can exercise it without any real connections being present.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    /// Acquires a handle which can be used to issue queries against the database
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, Error>;
}

/// An acquired database connection which can be borrowed to execute queries
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Implementors can open a database transaction. Connectivity inside the transaction
/// is exposed through the returned handle.
pub trait Transactable: Sync {
    type Handle: ExternalConnectivity + TransactionHandle + Send;

    /// Begins a database transaction
    async fn start_transaction(&self) -> Result<Self::Handle, Error>;
}

/// An open database transaction. Dropping the handle without invoking
/// [commit](TransactionHandle::commit) rolls the transaction back.
pub trait TransactionHandle {
    /// Commits the transaction
    async fn commit(self) -> Result<(), Error>;
}
