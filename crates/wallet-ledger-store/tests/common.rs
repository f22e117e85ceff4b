//! Shared ledger scenarios, run against every store backend.

#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{Duration, Utc};

use wallet_ledger_core::{
    ErrorKind, HistoryQuery, LedgerError, OperationType, TransactionId, UserId, Wallet,
};
use wallet_ledger_store::{LedgerStore, WalletRepository};

/// A user id no other test run will produce.
pub fn unique_user(name: &str) -> UserId {
    UserId::new(format!("{name}-{}", TransactionId::generate())).unwrap()
}

/// A transaction id no other test run will produce.
pub fn unique_key(label: &str) -> TransactionId {
    TransactionId::new(format!("{label}-{}", TransactionId::generate()))
}

/// Create a wallet for a fresh user and optionally fund it.
pub async fn funded_wallet<S: LedgerStore>(
    repo: &WalletRepository<S>,
    name: &str,
    balance: i64,
) -> UserId {
    let user = unique_user(name);
    repo.create(&user).await.unwrap();
    if balance > 0 {
        repo.deposit(Utc::now(), &user, &unique_key("fund"), balance)
            .await
            .unwrap();
    }
    user
}

/// Sum of the signed entry amounts of a wallet.
pub async fn history_sum<S: LedgerStore>(repo: &WalletRepository<S>, user: &UserId) -> i64 {
    let query = HistoryQuery::latest().with_limit(10_000);
    repo.get_transactions(user, &query)
        .await
        .unwrap()
        .iter()
        .map(wallet_ledger_core::Transaction::balance_delta)
        .sum()
}

// ============================================================================
// Wallets
// ============================================================================

pub async fn create_then_get<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = unique_user("create");

    let created = repo.create(&user).await.unwrap();
    assert_eq!(created, Wallet::new(user.clone()));
    assert!(repo.exists(&user).await.unwrap());

    let fetched = repo.get(&user).await.unwrap();
    assert_eq!(fetched.balance, 0);
}

pub async fn create_is_idempotent<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "recreate", 250).await;

    let again = repo.create(&user).await.unwrap();
    assert_eq!(again.balance, 250);
}

pub async fn get_unknown_wallet_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let ghost = unique_user("ghost");

    let err = repo.get(&ghost).await.unwrap_err();
    assert!(matches!(err, LedgerError::WalletNotFound { ref user_id } if *user_id == ghost));
    assert!(!repo.exists(&ghost).await.unwrap());
}

// ============================================================================
// Deposit / Withdraw
// ============================================================================

pub async fn deposit_then_withdraw<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = unique_user("alice");
    repo.create(&user).await.unwrap();

    let wallet = repo
        .deposit(Utc::now(), &user, &unique_key("d1"), 1000)
        .await
        .unwrap();
    assert_eq!(wallet.balance, 1000);

    let wallet = repo
        .withdraw(Utc::now(), &user, &unique_key("w1"), 900)
        .await
        .unwrap();
    assert_eq!(wallet.balance, 100);

    let err = repo
        .withdraw(Utc::now(), &user, &unique_key("w2"), 200)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEnoughBalance);

    assert_eq!(repo.get(&user).await.unwrap().balance, 100);
    let history = repo
        .get_transactions(&user, &HistoryQuery::latest())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].operation_type, OperationType::Withdraw);
    assert_eq!(history[1].operation_type, OperationType::Deposit);
}

pub async fn non_positive_amounts_are_rejected<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "amounts", 10).await;
    let other = funded_wallet(repo, "amounts-peer", 0).await;

    for amount in [0, -5] {
        let err = repo
            .deposit(Utc::now(), &user, &unique_key("d"), amount)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(a) if a == amount));

        let err = repo
            .withdraw(Utc::now(), &user, &unique_key("w"), amount)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);

        let err = repo
            .transfer(Utc::now(), &user, &unique_key("t"), amount, &other)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }

    assert_eq!(repo.get(&user).await.unwrap().balance, 10);
    assert_eq!(history_sum(repo, &user).await, 10);
}

pub async fn deposit_replay_returns_current_wallet<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "replay", 0).await;
    let key = unique_key("d1");

    let first = repo.deposit(Utc::now(), &user, &key, 100).await.unwrap();
    assert_eq!(first.balance, 100);

    repo.withdraw(Utc::now(), &user, &unique_key("w1"), 30)
        .await
        .unwrap();

    let replayed = repo.deposit(Utc::now(), &user, &key, 100).await.unwrap();
    assert_eq!(replayed.balance, 70);

    let history = repo
        .get_transactions(&user, &HistoryQuery::latest())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

pub async fn withdraw_replay_is_a_no_op<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "withdraw-replay", 100).await;
    let key = unique_key("w1");

    repo.withdraw(Utc::now(), &user, &key, 40).await.unwrap();
    let replayed = repo.withdraw(Utc::now(), &user, &key, 40).await.unwrap();

    assert_eq!(replayed.balance, 60);
    assert_eq!(history_sum(repo, &user).await, 60);
}

pub async fn withdraw_from_unknown_wallet_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let ghost = unique_user("ghost");

    let err = repo
        .withdraw(Utc::now(), &ghost, &unique_key("w1"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WalletNotFound);
}

pub async fn deposit_to_unknown_wallet_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let ghost = unique_user("ghost");
    let key = unique_key("d1");

    let err = repo.deposit(Utc::now(), &ghost, &key, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WalletNotFound);
    assert!(!repo.exists_transaction_id(key.id()).await.unwrap());
}

// ============================================================================
// Transfer
// ============================================================================

pub async fn transfer_moves_funds_and_writes_both_legs<S: LedgerStore>(
    repo: &WalletRepository<S>,
) {
    let alice = funded_wallet(repo, "alice", 500).await;
    let bob = funded_wallet(repo, "bob", 0).await;
    let key = unique_key("t1");

    let wallet = repo
        .transfer(Utc::now(), &alice, &key, 200, &bob)
        .await
        .unwrap();
    assert_eq!(wallet.user_id, alice);
    assert_eq!(wallet.balance, 300);
    assert_eq!(repo.get(&bob).await.unwrap().balance, 200);

    let out = &repo
        .get_transactions(&alice, &HistoryQuery::latest())
        .await
        .unwrap()[0];
    let incoming = &repo
        .get_transactions(&bob, &HistoryQuery::latest())
        .await
        .unwrap()[0];

    assert_eq!(out.operation_type, OperationType::TransferOut);
    assert_eq!(out.transaction_id, key);
    assert_eq!(out.passive_user_id.as_ref(), Some(&bob));

    assert_eq!(incoming.operation_type, OperationType::TransferIn);
    assert_eq!(incoming.transaction_id.id(), key.passive_id());
    assert_eq!(incoming.passive_user_id.as_ref(), Some(&alice));
    assert_eq!(incoming.amount, out.amount);
    assert_eq!(incoming.created_at, out.created_at);

    assert!(repo.exists_transaction_id(key.id()).await.unwrap());
    assert!(repo.exists_transaction_id(&key.passive_id()).await.unwrap());
}

pub async fn transfer_replay_is_a_no_op<S: LedgerStore>(repo: &WalletRepository<S>) {
    let alice = funded_wallet(repo, "alice", 500).await;
    let bob = funded_wallet(repo, "bob", 0).await;
    let key = unique_key("t1");

    repo.transfer(Utc::now(), &alice, &key, 200, &bob)
        .await
        .unwrap();
    let replayed = repo
        .transfer(Utc::now(), &alice, &key, 200, &bob)
        .await
        .unwrap();

    assert_eq!(replayed.balance, 300);
    assert_eq!(repo.get(&bob).await.unwrap().balance, 200);
    assert_eq!(history_sum(repo, &alice).await, 300);
    assert_eq!(history_sum(repo, &bob).await, 200);
}

pub async fn transfer_to_self_is_rejected<S: LedgerStore>(repo: &WalletRepository<S>) {
    let alice = funded_wallet(repo, "alice", 100).await;

    let err = repo
        .transfer(Utc::now(), &alice, &unique_key("t1"), 10, &alice)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferToSelf);
    assert_eq!(repo.get(&alice).await.unwrap().balance, 100);
}

pub async fn transfer_without_funds_changes_nothing<S: LedgerStore>(repo: &WalletRepository<S>) {
    let alice = funded_wallet(repo, "alice", 50).await;
    let bob = funded_wallet(repo, "bob", 0).await;
    let key = unique_key("t1");

    let err = repo
        .transfer(Utc::now(), &alice, &key, 51, &bob)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEnoughBalance);

    assert_eq!(repo.get(&alice).await.unwrap().balance, 50);
    assert_eq!(repo.get(&bob).await.unwrap().balance, 0);
    assert!(!repo.exists_transaction_id(key.id()).await.unwrap());
    assert!(repo
        .get_transactions(&bob, &HistoryQuery::latest())
        .await
        .unwrap()
        .is_empty());
}

pub async fn transfer_to_unknown_wallet_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let alice = funded_wallet(repo, "alice", 50).await;
    let ghost = unique_user("ghost");

    let err = repo
        .transfer(Utc::now(), &alice, &unique_key("t1"), 10, &ghost)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::WalletNotFound { ref user_id } if *user_id == ghost));
    assert_eq!(repo.get(&alice).await.unwrap().balance, 50);
}

pub async fn transfer_with_taken_passive_key_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let alice = funded_wallet(repo, "alice", 500).await;
    let bob = funded_wallet(repo, "bob", 0).await;
    let key = unique_key("t1");

    repo.deposit(Utc::now(), &alice, &TransactionId::new(key.passive_id()), 50)
        .await
        .unwrap();

    let err = repo
        .transfer(Utc::now(), &alice, &key, 100, &bob)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);

    assert_eq!(repo.get(&alice).await.unwrap().balance, 550);
    assert_eq!(repo.get(&bob).await.unwrap().balance, 0);
    assert!(!repo.exists_transaction_id(key.id()).await.unwrap());
    assert!(repo
        .get_transactions(&bob, &HistoryQuery::latest())
        .await
        .unwrap()
        .is_empty());
}

pub async fn transfers_conserve_total<S: LedgerStore>(repo: &WalletRepository<S>) {
    let users = [
        funded_wallet(repo, "a", 300).await,
        funded_wallet(repo, "b", 200).await,
        funded_wallet(repo, "c", 100).await,
    ];

    let moves = [
        (0, 1, 50),
        (1, 2, 120),
        (2, 0, 200),
        (0, 2, 400),
        (1, 0, 30),
        (2, 1, 500),
    ];
    let mut succeeded = 0;
    for (from, to, amount) in moves {
        match repo
            .transfer(Utc::now(), &users[from], &unique_key("t"), amount, &users[to])
            .await
        {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::NotEnoughBalance),
        }
    }
    assert_eq!(succeeded, 5);

    let expected = [80, 100, 420];
    let mut total = 0;
    for (user, expected) in users.iter().zip(expected) {
        let balance = repo.get(user).await.unwrap().balance;
        assert_eq!(balance, expected);
        assert_eq!(balance, history_sum(repo, user).await);
        total += balance;
    }
    assert_eq!(total, 600);
}

// ============================================================================
// History
// ============================================================================

pub async fn history_pages_are_stable<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "pages", 0).await;
    let start = Utc::now() - Duration::seconds(60);

    // Two entries per timestamp so pages split inside a tie.
    for i in 0..7_i64 {
        let at = start + Duration::seconds(i / 2);
        repo.deposit(at, &user, &unique_key("d"), i + 1)
            .await
            .unwrap();
    }

    let mut query = HistoryQuery::latest().with_limit(3);
    let mut seen = Vec::new();
    loop {
        let page = repo.get_transactions(&user, &query).await.unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 3);
        seen.extend(page.iter().map(|entry| entry.amount));
        match query.after(&page) {
            Some(next) => query = next,
            None => break,
        }
    }

    assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
}

pub async fn history_id_bound_applies_alone<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "id-bound", 0).await;
    let start = Utc::now() - Duration::seconds(60);
    for i in 0..5_i64 {
        repo.deposit(start + Duration::seconds(i), &user, &unique_key("d"), i + 1)
            .await
            .unwrap();
    }

    let all = repo
        .get_transactions(&user, &HistoryQuery::latest())
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let query = HistoryQuery {
        id_before: Some(all[2].id),
        ..HistoryQuery::latest()
    };
    let page = repo.get_transactions(&user, &query).await.unwrap();
    let amounts: Vec<i64> = page.iter().map(|entry| entry.amount).collect();
    assert_eq!(amounts, vec![2, 1]);
}

pub async fn history_bounds_apply_independently<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "bounds", 0).await;
    let start = Utc::now() - Duration::seconds(60);

    // The second entry gets the larger id but the older timestamp.
    repo.deposit(start + Duration::seconds(10), &user, &unique_key("d"), 1)
        .await
        .unwrap();
    repo.deposit(start, &user, &unique_key("d"), 2)
        .await
        .unwrap();
    let newest_id = repo
        .get_transactions(&user, &HistoryQuery::latest())
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.id)
        .max()
        .unwrap();

    let by_id = HistoryQuery::latest().before(start + Duration::seconds(10), newest_id);
    let page = repo.get_transactions(&user, &by_id).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].amount, 1);

    let by_time = HistoryQuery::latest().before(start + Duration::seconds(5), i64::MAX);
    let page = repo.get_transactions(&user, &by_time).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].amount, 2);
}

pub async fn history_excludes_future_entries<S: LedgerStore>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "future", 0).await;
    repo.deposit(Utc::now() + Duration::hours(1), &user, &unique_key("d"), 5)
        .await
        .unwrap();

    let page = repo
        .get_transactions(&user, &HistoryQuery::latest())
        .await
        .unwrap();
    assert!(page.is_empty());

    let later = HistoryQuery::latest().before(Utc::now() + Duration::hours(2), i64::MAX);
    assert_eq!(repo.get_transactions(&user, &later).await.unwrap().len(), 1);
}

pub async fn history_of_unknown_wallet_fails<S: LedgerStore>(repo: &WalletRepository<S>) {
    let err = repo
        .get_transactions(&unique_user("ghost"), &HistoryQuery::latest())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WalletNotFound);
}

// ============================================================================
// Concurrency
// ============================================================================

pub async fn concurrent_withdrawals_never_overdraw<S: LedgerStore + 'static>(
    repo: &WalletRepository<S>,
) {
    let user = funded_wallet(repo, "race", 1000).await;

    let tasks = (0..25).map(|_| {
        let repo = repo.clone();
        let user = user.clone();
        tokio::spawn(async move {
            repo.withdraw(Utc::now(), &user, &unique_key("w"), 70).await
        })
    });
    let results = futures::future::join_all(tasks).await;

    let succeeded = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|result| match result {
            Ok(_) => true,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::NotEnoughBalance);
                false
            }
        })
        .count();

    assert_eq!(succeeded, 14);
    assert_eq!(repo.get(&user).await.unwrap().balance, 20);
    assert_eq!(history_sum(repo, &user).await, 20);
}

pub async fn concurrent_replays_apply_once<S: LedgerStore + 'static>(repo: &WalletRepository<S>) {
    let user = funded_wallet(repo, "replay-race", 0).await;
    let key = unique_key("d1");

    let tasks = (0..10).map(|_| {
        let repo = repo.clone();
        let user = user.clone();
        let key = key.clone();
        tokio::spawn(async move { repo.deposit(Utc::now(), &user, &key, 100).await })
    });
    for joined in futures::future::join_all(tasks).await {
        let wallet = joined.unwrap().unwrap();
        assert_eq!(wallet.balance, 100);
    }

    assert_eq!(repo.get(&user).await.unwrap().balance, 100);
    assert_eq!(history_sum(repo, &user).await, 100);
}
