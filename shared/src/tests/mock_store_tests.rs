use crate::error::ServiceError;
use crate::models::{PartyReplier, ReplyState};
use crate::store::ReplierStore;
use crate::test_utils::mock_replier_store::MockReplierStore;

fn replier_for(owner: &str) -> PartyReplier {
    let mut replier = PartyReplier::new(Some(owner.to_string()));
    replier.record_reply("guest_a", ReplyState::Agreed);
    replier.record_reply("guest_b", ReplyState::Refused);
    replier
}

#[tokio::test]
async fn test_mock_replier_store_lifecycle() {
    let store = MockReplierStore::new();
    let replier = replier_for("host_1");
    let id = replier.id().to_string();

    let created = store.create_replier(replier.clone()).await.unwrap();
    assert_eq!(created, replier);

    let fetched = store.get_replier(&id).await.unwrap();
    assert_eq!(fetched.owner.as_deref(), Some("host_1"));
    assert_eq!(fetched.users_agreed, vec!["guest_a"]);

    let mut changed = fetched.clone();
    changed.record_reply("guest_b", ReplyState::InThought);
    let updated = store
        .update_replier(changed, &fetched.base.updated_at)
        .await
        .unwrap();
    assert_eq!(updated.users_in_thought, vec!["guest_b"]);
    assert!(updated.users_refused.is_empty());
    assert_eq!(updated.base.created_at, fetched.base.created_at);

    store.delete_replier(&id).await.unwrap();
    assert!(matches!(
        store.get_replier(&id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_duplicate_id() {
    let replier = replier_for("host_1");
    let store = MockReplierStore::with_data(vec![replier.clone()]);

    assert!(matches!(
        store.create_replier(replier).await,
        Err(ServiceError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_update_and_delete_missing_records() {
    let store = MockReplierStore::new();

    assert!(matches!(
        store.update_replier(PartyReplier::new(None), "2024-01-01T00:00:00+00:00").await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        store.delete_replier("missing").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_lookup_by_owner_and_participant() {
    let ownerless = PartyReplier::new(None);
    let store = MockReplierStore::with_data(vec![
        replier_for("host_1"),
        replier_for("host_1"),
        replier_for("host_2"),
        ownerless,
    ]);

    assert_eq!(store.get_repliers_by_owner("host_1").await.unwrap().len(), 2);
    assert_eq!(store.get_repliers_by_owner("host_2").await.unwrap().len(), 1);
    assert!(store.get_repliers_by_owner("").await.unwrap().is_empty());

    assert_eq!(store.get_repliers_by_participant("guest_b").await.unwrap().len(), 3);
    assert!(store
        .get_repliers_by_participant("host_1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_error_mode_fails_every_call() {
    let store = MockReplierStore::new_error();

    assert!(matches!(
        store.create_replier(PartyReplier::new(None)).await,
        Err(ServiceError::InternalError(_))
    ));
    assert!(matches!(
        store.get_repliers_by_owner("host_1").await,
        Err(ServiceError::InternalError(_))
    ));
}

#[tokio::test]
async fn test_stale_update_is_rejected() {
    let replier = replier_for("host_1");
    let id = replier.id().to_string();
    let store = MockReplierStore::with_data(vec![replier]);

    // Two callers read the same version of the record
    let mut first = store.get_replier(&id).await.unwrap();
    let mut second = store.get_replier(&id).await.unwrap();
    let read_at = first.base.updated_at.clone();

    first.record_reply("alice", ReplyState::Agreed);
    second.record_reply("bob", ReplyState::Refused);

    store.update_replier(first, &read_at).await.unwrap();
    assert!(matches!(
        store.update_replier(second, &read_at).await,
        Err(ServiceError::Conflict(_))
    ));

    let stored = store.get_replier(&id).await.unwrap();
    assert_eq!(stored.users_agreed, vec!["guest_a", "alice"]);
    assert_eq!(stored.users_refused, vec!["guest_b"]);
}

#[tokio::test]
async fn test_empty_owner_is_rejected() {
    let store = MockReplierStore::new();

    assert!(matches!(
        store.create_replier(PartyReplier::new(Some(String::new()))).await,
        Err(ServiceError::ValidationError(_))
    ));
}
