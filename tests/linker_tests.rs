//! Reconciliation integration tests: idempotence, the no-duplicate-account
//! property under concurrency, lookup paths, defaults, and the duplicate-key
//! and conditional-link recovery paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use idlink::config::LinkDefaults;
use idlink::error::AppResult;
use idlink::linker::{AccountLinker, LinkOutcome, ProfileHints};
use idlink::store::{AccountStore, MemoryStore, NewUser, User, UserStore};

fn linker_over(store: &Arc<MemoryStore>) -> AccountLinker {
    AccountLinker::new(store.clone(), store.clone(), LinkDefaults::default())
}

fn hints_with_email(email: &str) -> ProfileHints {
    ProfileHints { email: Some(email.to_string()), ..ProfileHints::default() }
}

#[tokio::test]
async fn reconcile_twice_is_idempotent() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = linker_over(&store);

    let first = linker.reconcile("sub_1", &hints_with_email("a@example.com")).await?;
    let LinkOutcome::Created { user_id, account_id } = first.clone() else {
        panic!("expected Created on first reconcile, got {:?}", first);
    };

    // The created account is owned by the created user
    let account = AccountStore::find_by_id(store.as_ref(), &account_id)
        .await?
        .expect("account must exist");
    assert_eq!(account.owner_user_id, user_id);

    let second = linker.reconcile("sub_1", &hints_with_email("a@example.com")).await?;
    assert_eq!(second, LinkOutcome::AlreadyLinked { account_id }, "second call must abort with the same account");
    Ok(())
}

#[tokio::test]
async fn concurrent_reconciles_create_exactly_one_account() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = Arc::new(linker_over(&store));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let linker = linker.clone();
        tasks.push(tokio::spawn(async move {
            linker.reconcile("sub_race", &ProfileHints::default()).await
        }));
    }
    let outcomes: Vec<LinkOutcome> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|j| j.expect("task must not panic").expect("reconcile must not error"))
        .collect();

    idlink::tprintln!("concurrent outcomes: {:?}", outcomes);
    let created: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o, LinkOutcome::Created { .. }))
        .collect();
    assert_eq!(created.len(), 1, "exactly one call wins the create path");
    let winner = created[0].account_id().to_string();
    for o in &outcomes {
        assert_eq!(o.account_id(), winner, "all callers observe the same account");
    }

    let user = store
        .find_by_subject_id("sub_race")
        .await?
        .expect("user must exist");
    assert_eq!(AccountStore::count_for_owner(store.as_ref(), &user.id).await?, 1, "no duplicate accounts");
    Ok(())
}

#[tokio::test]
async fn lookup_account_before_and_after_reconcile() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = linker_over(&store);

    assert!(linker.lookup_account("sub_never").await?.is_none());

    let outcome = linker.reconcile("sub_1", &hints_with_email("a@example.com")).await?;
    let account = linker
        .lookup_account("sub_1")
        .await?
        .expect("account must be visible after reconcile");
    assert_eq!(account.id, outcome.account_id());

    let user = store.find_by_subject_id("sub_1").await?.expect("user exists");
    assert_eq!(account.owner_user_id, user.id);
    Ok(())
}

#[tokio::test]
async fn reconcile_without_hints_uses_documented_defaults() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = linker_over(&store);

    let outcome = linker.reconcile("sub_2", &ProfileHints::default()).await?;
    assert!(matches!(outcome, LinkOutcome::Created { .. }));

    let user = store.find_by_subject_id("sub_2").await?.expect("user exists");
    assert_eq!(user.role, "primary_parent");
    assert_eq!(user.first_name, "User");
    assert_eq!(user.last_name, "Name");
    assert_eq!(user.mobile_number, 1234567890);
    assert_eq!(user.address, "123 Main Street");
    assert_eq!(user.pincode, 12345);
    assert_eq!(user.email, "sub_2@placeholder.invalid");

    let account = linker.lookup_account("sub_2").await?.expect("account exists");
    assert_eq!(account.subscription_plan, "premium");
    assert_eq!(account.subscription_status, "active");
    let window = account.subscription_end - account.subscription_start;
    assert_eq!(window.num_days(), 365);
    Ok(())
}

#[tokio::test]
async fn hintless_users_do_not_collide_on_placeholder_email() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = linker_over(&store);

    let a = linker.reconcile("sub_a", &ProfileHints::default()).await?;
    let b = linker.reconcile("sub_b", &ProfileHints::default()).await?;
    assert!(matches!(a, LinkOutcome::Created { .. }));
    assert!(matches!(b, LinkOutcome::Created { .. }));
    assert_ne!(a.account_id(), b.account_id());
    Ok(())
}

/// UserStore wrapper simulating another process: hides the user from the
/// first N lookups so the insert runs into the store-level uniqueness
/// backstop, forcing the duplicate-key recovery path.
struct HidingUserStore {
    inner: Arc<MemoryStore>,
    hide_lookups: AtomicUsize,
}

#[async_trait]
impl UserStore for HidingUserStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>> {
        if self.hide_lookups.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            return Ok(None);
        }
        self.inner.find_by_subject_id(subject_id).await
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        UserStore::insert(self.inner.as_ref(), user).await
    }

    async fn link_account(&self, user_id: &str, account_id: &str) -> AppResult<bool> {
        self.inner.link_account(user_id, account_id).await
    }

    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> AppResult<()> {
        self.inner.update_last_login(user_id, at).await
    }

    async fn clear(&self) -> AppResult<()> {
        UserStore::clear(self.inner.as_ref()).await
    }
}

#[tokio::test]
async fn duplicate_key_conflict_recovers_via_re_read() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    // Another process already created the (unlinked) user
    let seeded = UserStore::insert(
        store.as_ref(),
        NewUser {
            subject_id: "sub_dup".into(),
            role: "primary_parent".into(),
            email: "dup@example.com".into(),
            first_name: "User".into(),
            last_name: "Name".into(),
            mobile_number: 1234567890,
            address: "123 Main Street".into(),
            pincode: 12345,
            avatar: "https://via.placeholder.com/150".into(),
            settings: serde_json::json!({"theme": "light"}),
            custom_claims: serde_json::json!({"role": "parent"}),
            last_login: Utc::now(),
        },
    )
    .await?;

    // Hide the seeded user from the fast path and the locked re-check so
    // this call attempts its own insert and hits the backstop.
    let users = Arc::new(HidingUserStore { inner: store.clone(), hide_lookups: AtomicUsize::new(2) });
    let linker = AccountLinker::new(users, store.clone(), LinkDefaults::default());

    let outcome = linker
        .reconcile("sub_dup", &hints_with_email("dup@example.com"))
        .await?;
    let LinkOutcome::Created { user_id, .. } = outcome else {
        panic!("expected Created after recovery, got {:?}", outcome);
    };
    assert_eq!(user_id, seeded.id, "recovery must continue on the pre-existing record");
    assert_eq!(AccountStore::count_for_owner(store.as_ref(), &seeded.id).await?, 1);
    Ok(())
}

/// UserStore wrapper that links the user to a rival account just before the
/// linker's own conditional write, making this call the race loser.
struct RivalLinkingStore {
    inner: Arc<MemoryStore>,
    rival_account: String,
    interventions: AtomicUsize,
}

#[async_trait]
impl UserStore for RivalLinkingStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>> {
        self.inner.find_by_subject_id(subject_id).await
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        UserStore::insert(self.inner.as_ref(), user).await
    }

    async fn link_account(&self, user_id: &str, account_id: &str) -> AppResult<bool> {
        if self.interventions.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            // Interleaved writer from another process wins the link
            self.inner.link_account(user_id, &self.rival_account).await?;
        }
        self.inner.link_account(user_id, account_id).await
    }

    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> AppResult<()> {
        self.inner.update_last_login(user_id, at).await
    }

    async fn clear(&self) -> AppResult<()> {
        UserStore::clear(self.inner.as_ref()).await
    }
}

#[tokio::test]
async fn conditional_link_race_loser_reports_the_canonical_account() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let users = Arc::new(RivalLinkingStore {
        inner: store.clone(),
        rival_account: "rival_account".into(),
        interventions: AtomicUsize::new(1),
    });
    let linker = AccountLinker::new(users, store.clone(), LinkDefaults::default());

    let outcome = linker.reconcile("sub_lost", &ProfileHints::default()).await?;
    assert_eq!(
        outcome,
        LinkOutcome::AlreadyLinked { account_id: "rival_account".into() },
        "race loser must surface the winner's link"
    );

    // The loser's account was written but never became canonical
    let user = store.find_by_subject_id("sub_lost").await?.expect("user exists");
    assert_eq!(user.account_id.as_deref(), Some("rival_account"));
    assert_eq!(AccountStore::count_for_owner(store.as_ref(), &user.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn update_last_login_refreshes_the_record() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let linker = linker_over(&store);

    linker.reconcile("sub_login", &ProfileHints::default()).await?;
    let user = store.find_by_subject_id("sub_login").await?.expect("user exists");

    let later = user.last_login + chrono::Duration::hours(1);
    store.update_last_login(&user.id, later).await?;
    let reread = store.find_by_subject_id("sub_login").await?.expect("user exists");
    assert_eq!(reread.last_login, later);
    Ok(())
}
