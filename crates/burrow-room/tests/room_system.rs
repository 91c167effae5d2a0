//! Integration tests: the user service driving real rooms.

use burrow_room::{RoomConfig, RoomError, RoomRegistry};
use burrow_session::{RegistryConfig, SessionError, User, UserRegistry, UserService};
use futures_util::future::join_all;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

/// Each user's transport is the sending half of an outbound channel.
type Outbox = mpsc::UnboundedSender<String>;

type Service = UserService<Outbox, RoomRegistry<Outbox>>;

fn service() -> Service {
    service_with(RegistryConfig::default())
}

fn service_with(config: RegistryConfig) -> Service {
    UserService::new(UserRegistry::new(config), RoomRegistry::new())
}

/// Creates a dummy outbox (receiver is dropped immediately).
fn dummy_outbox() -> Outbox {
    mpsc::unbounded_channel().0
}

async fn login(svc: &Service, name: &str) -> User<Outbox> {
    svc.login(name, -1, true, dummy_outbox()).await.unwrap()
}

fn room_error(err: &SessionError) -> Option<&RoomError> {
    match err {
        SessionError::Room(inner) => inner.downcast_ref::<RoomError>(),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_records_membership_in_both_layers() {
    let svc = service();
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let mut alice = login(&svc, "alice").await;

    svc.join(&mut alice, &lobby).await.unwrap();

    assert!(lobby.contains("alice").await.unwrap());
    assert_eq!(svc.get("alice").await.unwrap().room_name(), "lobby");
}

#[tokio::test]
async fn test_join_hands_transport_to_room() {
    let svc = service();
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut alice = svc.login("alice", 3, false, tx).await.unwrap();

    svc.join(&mut alice, &lobby).await.unwrap();
    let outbox = lobby.transport_of("alice").await.unwrap().expect("member");
    outbox.send("welcome".to_string()).unwrap();

    assert_eq!(rx.recv().await.as_deref(), Some("welcome"));
}

#[tokio::test]
async fn test_join_full_room_leaves_session_outside() {
    let svc = service();
    let duel = svc.rooms().create("duel", RoomConfig { max_users: 1 }).await.unwrap();
    let mut alice = login(&svc, "alice").await;
    let mut bob = login(&svc, "bob").await;
    svc.join(&mut alice, &duel).await.unwrap();

    let err = svc.join(&mut bob, &duel).await.unwrap_err();

    assert!(matches!(room_error(&err), Some(RoomError::RoomFull(_))), "got {err:?}");
    assert_eq!(svc.get("bob").await.unwrap().room_name(), "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_concurrent_race_for_limited_slots() {
    let svc = service();
    svc.rooms().create("arena", RoomConfig { max_users: 3 }).await.unwrap();

    let tasks = (0..10).map(|i| {
        let svc = svc.clone();
        tokio::spawn(async move {
            let name = format!("player{i}");
            let mut user = svc.login(&name, -1, true, dummy_outbox()).await.unwrap();
            let arena = svc.rooms().get("arena").await.unwrap();
            let joined = svc.join(&mut user, &arena).await.is_ok();
            (name, joined)
        })
    });
    let outcomes: Vec<(String, bool)> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let arena = svc.rooms().get("arena").await.unwrap();
    assert_eq!(outcomes.iter().filter(|(_, joined)| *joined).count(), 3);
    assert_eq!(arena.user_count().await.unwrap(), 3);
    for (name, joined) in outcomes {
        let expected = if joined { "arena" } else { "" };
        assert_eq!(svc.get(&name).await.unwrap().room_name(), expected, "{name}");
    }
}

#[tokio::test]
async fn test_join_switches_rooms() {
    let svc = service();
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let arena = svc.rooms().create("arena", RoomConfig::default()).await.unwrap();
    let mut alice = login(&svc, "alice").await;
    svc.join(&mut alice, &lobby).await.unwrap();

    svc.join(&mut alice, &arena).await.unwrap();

    assert!(!lobby.contains("alice").await.unwrap());
    assert!(arena.contains("alice").await.unwrap());
    assert_eq!(alice.room_name(), "arena");
}

#[tokio::test]
async fn test_leave_destroyed_room_returns_room_not_found() {
    let svc = service();
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let mut alice = login(&svc, "alice").await;
    svc.join(&mut alice, &lobby).await.unwrap();
    svc.rooms().destroy("lobby").await.unwrap();

    let result = svc.leave(&mut alice).await;

    assert!(matches!(result, Err(SessionError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_log_out_from_destroyed_room_still_logs_out() {
    let svc = service();
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let mut alice = login(&svc, "alice").await;
    svc.join(&mut alice, &lobby).await.unwrap();
    svc.rooms().destroy("lobby").await.unwrap();

    svc.log_out(&alice).await;

    assert!(svc.registry().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_kick_frees_room_slot() {
    let svc = service();
    let duel = svc.rooms().create("duel", RoomConfig { max_users: 1 }).await.unwrap();
    let mut alice = login(&svc, "alice").await;
    let mut bob = login(&svc, "bob").await;
    svc.join(&mut alice, &duel).await.unwrap();

    svc.kick("alice").await.unwrap();
    svc.join(&mut bob, &duel).await.unwrap();

    assert_eq!(duel.users().await.unwrap(), vec!["bob".to_string()]);
}

#[tokio::test]
async fn test_log_out_after_reconnect_leaves_new_session_seated() {
    let svc = service_with(RegistryConfig {
        kick_duplicate_on_login: true,
        ..RegistryConfig::default()
    });
    let lobby = svc.rooms().create("lobby", RoomConfig::default()).await.unwrap();
    let mut old = login(&svc, "alice").await;
    svc.join(&mut old, &lobby).await.unwrap();
    let mut new = login(&svc, "alice").await;
    svc.join(&mut new, &lobby).await.unwrap();

    svc.log_out(&old).await;

    let live = svc.get("alice").await.unwrap();
    assert_eq!(live.serial(), new.serial());
    assert_eq!(live.room_name(), "lobby");
    assert!(lobby.contains("alice").await.unwrap(), "membership matches the registry");
}
