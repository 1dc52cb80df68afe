use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use idgate_auth::{Account, Email};
use idgate_core::{AccountId, AggregateRoot};
use idgate_service::{AccountRepository, RepositoryError, UnitOfWork, UowScope};

#[derive(Debug, Default)]
struct Store {
    accounts: HashMap<AccountId, Account>,
    by_email: HashMap<Email, AccountId>,
}

#[derive(Debug, Default)]
struct Counters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    attempts: AtomicUsize,
    fail_commits: AtomicBool,
    fail_attempt: AtomicUsize,
}

impl Counters {
    /// Count a commit attempt and report whether it has to fail.
    fn attempt_fails(&self) -> bool {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.fail_commits.load(Ordering::SeqCst) || self.fail_attempt.load(Ordering::SeqCst) == attempt
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Backend(anyhow::anyhow!("account store lock poisoned"))
}

/// In-memory unit of work over a shared account table.
///
/// Intended for tests/dev. Writes are staged per scope and become visible to
/// other scopes only on commit. The email column is unique: `create` checks
/// committed and staged rows, and commit checks again so that two scopes
/// racing on the same email cannot both win.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitOfWork {
    store: Arc<RwLock<Store>>,
    counters: Arc<Counters>,
}

impl InMemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }

    /// Make every subsequent commit fail with a backend error.
    pub fn fail_commits(&self, fail: bool) {
        self.counters.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Make only the `n`th commit attempt (1-based, counted from the start)
    /// fail with a backend error. Zero disarms it.
    pub fn fail_commit_attempt(&self, n: usize) {
        self.counters.fail_attempt.store(n, Ordering::SeqCst);
    }

    /// Committed accounts, in no particular order.
    pub fn accounts(&self) -> Vec<Account> {
        self.store
            .read()
            .map(|s| s.accounts.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Insert a committed row directly, bypassing scopes. For fixtures.
    ///
    /// An account without identifier gets one; the email must be free.
    pub fn seed(&self, mut account: Account) -> Result<Account, RepositoryError> {
        let mut store = self.store.write().map_err(|_| poisoned())?;
        if store.by_email.contains_key(account.email()) {
            return Err(RepositoryError::UniqueViolation(format!(
                "accounts.email = {}",
                account.email()
            )));
        }

        let id = match account.id() {
            Some(id) => *id,
            None => {
                let id = AccountId::new();
                account.assign_id(id)?;
                id
            }
        };
        store.by_email.insert(account.email().clone(), id);
        store.accounts.insert(id, account.clone());
        Ok(account)
    }

    pub fn find_by_email(&self, email: &Email) -> Option<Account> {
        let store = self.store.read().ok()?;
        let id = store.by_email.get(email)?;
        store.accounts.get(id).cloned()
    }
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn open(&self) -> Result<Box<dyn UowScope>, RepositoryError> {
        Ok(Box::new(InMemoryScope {
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
            staged: Vec::new(),
            closed: false,
        }))
    }
}

struct InMemoryScope {
    store: Arc<RwLock<Store>>,
    counters: Arc<Counters>,
    staged: Vec<Account>,
    closed: bool,
}

impl InMemoryScope {
    fn staged_by_email(&self, email: &Email) -> Option<&Account> {
        self.staged.iter().find(|a| a.email() == email)
    }

    fn discard(&mut self) {
        self.staged.clear();
        self.closed = true;
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AccountRepository for InMemoryScope {
    async fn get_by_email(&mut self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        if let Some(staged) = self.staged_by_email(email) {
            return Ok(Some(staged.clone()));
        }

        let store = self.store.read().map_err(|_| poisoned())?;
        Ok(store
            .by_email
            .get(email)
            .and_then(|id| store.accounts.get(id))
            .cloned())
    }

    async fn get_by_id(&mut self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        if let Some(staged) = self.staged.iter().find(|a| a.id() == Some(&id)) {
            return Ok(Some(staged.clone()));
        }

        let store = self.store.read().map_err(|_| poisoned())?;
        Ok(store.accounts.get(&id).cloned())
    }

    async fn create(&mut self, mut account: Account) -> Result<Account, RepositoryError> {
        let taken = self.staged_by_email(account.email()).is_some()
            || self
                .store
                .read()
                .map_err(|_| poisoned())?
                .by_email
                .contains_key(account.email());
        if taken {
            return Err(RepositoryError::UniqueViolation(format!(
                "accounts.email = {}",
                account.email()
            )));
        }

        account.assign_id(AccountId::new())?;
        self.staged.push(account.clone());
        Ok(account)
    }
}

#[async_trait::async_trait]
impl UowScope for InMemoryScope {
    fn accounts(&mut self) -> &mut dyn AccountRepository {
        self
    }

    async fn commit(mut self: Box<Self>) -> Result<(), RepositoryError> {
        if self.counters.attempt_fails() {
            self.discard();
            return Err(RepositoryError::Backend(anyhow::anyhow!("commit failed")));
        }

        let staged = std::mem::take(&mut self.staged);
        let mut store = self.store.write().map_err(|_| poisoned())?;

        if let Some(dup) = staged.iter().find(|a| store.by_email.contains_key(a.email())) {
            let email = dup.email().to_string();
            drop(store);
            self.discard();
            return Err(RepositoryError::UniqueViolation(format!("accounts.email = {email}")));
        }

        let written = staged.len();
        for account in staged {
            let Some(id) = account.id().copied() else {
                continue;
            };
            store.by_email.insert(account.email().clone(), id);
            store.accounts.insert(id, account);
        }
        drop(store);

        self.closed = true;
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(written, "unit of work committed");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), RepositoryError> {
        let discarded = self.staged.len();
        self.discard();
        tracing::debug!(discarded, "unit of work rolled back");
        Ok(())
    }
}

impl Drop for InMemoryScope {
    fn drop(&mut self) {
        if !self.closed {
            let discarded = self.staged.len();
            self.discard();
            tracing::warn!(discarded, "unit of work dropped without close; rolled back");
        }
    }
}
