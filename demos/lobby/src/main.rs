use std::time::Duration;

use burrow::prelude::*;
use tokio::sync::mpsc;

/// What the demo hands Burrow as a user's transport: the sending half of
/// that client's outbound queue.
type Outbox = mpsc::UnboundedSender<String>;

type Server = BurrowServer<Outbox>;

// ---------------------------------------------------------------------------
// Simulated clients
// ---------------------------------------------------------------------------

/// "Connects" a client: spawns a task that logs every line sent to it.
fn connect(client: &str) -> Outbox {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let client = client.to_string();
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            tracing::info!(client = %client, "<- {line}");
        }
    });
    tx
}

/// Sends `text` to every member of `room`. Returns how many got it.
async fn announce(room: &RoomHandle<Outbox>, text: &str) -> Result<usize, RoomError> {
    let mut delivered = 0;
    for member in room.users().await? {
        let Some(outbox) = room.transport_of(&member).await? else {
            continue; // left in between
        };
        if outbox.send(format!("[{}] {text}", room.name())).is_ok() {
            delivered += 1;
        }
    }
    Ok(delivered)
}

fn default_settings() -> ServerSettings {
    ServerSettings {
        server_name: "lobby-demo".into(),
        kick_duplicate_on_login: true,
        rooms: vec![
            RoomSpec {
                name: "lobby".into(),
                config: RoomConfig::default(),
            },
            RoomSpec {
                name: "arena".into(),
                config: RoomConfig { max_users: 4 },
            },
        ],
        ..ServerSettings::default()
    }
}

/// Reads settings from the JSON file named on the command line, if any.
fn load_settings() -> Result<ServerSettings, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(default_settings()),
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Logs every player in at once and puts them in `room`.
async fn arrive(
    server: &Server,
    room: &RoomHandle<Outbox>,
    names: &[&'static str],
) -> Result<Vec<User<Outbox>>, Box<dyn std::error::Error>> {
    let tasks: Vec<_> = names
        .iter()
        .map(|&name| {
            let server = server.clone();
            let room = room.clone();
            tokio::spawn(async move {
                let mut user = server
                    .users()
                    .login(name, NO_DATABASE_ID, true, connect(name))
                    .await?;
                server.users().join(&mut user, &room).await?;
                Ok::<_, BurrowError>(user)
            })
        })
        .collect();

    let mut users = Vec::with_capacity(tasks.len());
    for task in tasks {
        users.push(task.await??);
    }
    Ok(users)
}

/// Everyone races for `arena`. Losers have already left `fallback`, so
/// they are sent back there.
async fn race(
    server: &Server,
    arena: &RoomHandle<Outbox>,
    fallback: &RoomHandle<Outbox>,
    users: Vec<User<Outbox>>,
) -> Result<Vec<User<Outbox>>, Box<dyn std::error::Error>> {
    let tasks: Vec<_> = users
        .into_iter()
        .map(|mut user| {
            let server = server.clone();
            let arena = arena.clone();
            tokio::spawn(async move {
                let result = server.users().join(&mut user, &arena).await;
                (user, result)
            })
        })
        .collect();

    let mut users = Vec::new();
    for task in tasks {
        let (mut user, result) = task.await?;
        if let Err(e) = result {
            tracing::info!(user = %user.name(), error = %e, "no seat in the arena");
            if !user.is_in_room() {
                server.users().join(&mut user, fallback).await?;
            }
        }
        users.push(user);
    }
    Ok(users)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info")?;

    let server = Server::builder().settings(load_settings()?).start().await?;
    let lobby = server.rooms().get("lobby").await?;

    let users = arrive(&server, &lobby, &["ada", "bo", "cy", "dee", "eli", "fay"]).await?;
    announce(&lobby, "welcome!").await?;

    let users = match server.rooms().get("arena").await {
        Ok(arena) => {
            let users = race(&server, &arena, &lobby, users).await?;
            let seated = announce(&arena, "match starting").await?;
            tracing::info!(seated, "arena filled");
            users
        }
        Err(e) => {
            tracing::info!(error = %e, "no arena configured, skipping the race");
            users
        }
    };

    // ada reconnects from a second client.
    match server.users().login("ada", NO_DATABASE_ID, true, connect("ada#2")).await {
        Ok(ada) => tracing::info!(serial = ada.serial(), "ada reconnected"),
        Err(e) => tracing::info!(error = %e, "second ada refused"),
    }

    server.users().kick("bo").await?;
    for user in users.iter().filter(|u| u.name() == "cy") {
        server.users().log_out(user).await;
    }

    let mut online = server.registry().names().await?;
    online.sort();
    let in_lobby = lobby.user_count().await?;
    let logins = server.registry().total_logins().await?;
    tracing::info!(online = ?online, in_lobby, logins, "final state");

    // Let the client printers drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.shutdown().await?;
    Ok(())
}
