use super::{Database, Result};

/// A transaction started by [`Database::transaction`].
///
/// Dropping it before [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback) rolls it back before the next
/// operation on the database.
#[derive(Debug)]
pub struct Transaction {
    db: Database,
    done: bool,
    committed: bool,
}

impl Transaction {
    pub(super) fn new(db: Database) -> Self {
        Self {
            db,
            done: false,
            committed: false,
        }
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.db.execute("COMMIT").await?;
        debug!("transaction committed on {}", self.db.path());
        self.done = true;
        self.committed = true;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.db.execute("ROLLBACK").await?;
        debug!("transaction rolled back on {}", self.db.path());
        self.done = true;
        Ok(())
    }

    pub fn committed(&self) -> bool {
        self.committed
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.done {
            warn!("transaction on {} dropped without commit", self.db.path());
            self.db.schedule_rollback();
        }
    }
}
