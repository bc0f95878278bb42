use std::sync::Arc;
use std::time::Duration;

use gateway::error::ServiceError;
use gateway::models::event::{Event, EventFilter};
use gateway::models::user::{NewUser, User};
use gateway::rpc;
use gateway::services::auth::AuthService;
use gateway::services::event::EventService;
use gateway::services::local::InMemoryDirectory;
use gateway::services::remote::RemoteServices;
use gateway::services::user::UserService;

/// Serves an empty directory over RPC on an ephemeral port.
async fn spawn_services() -> RemoteServices {
    let directory = Arc::new(InMemoryDirectory::new());
    let app = rpc::server::router(directory.clone(), directory.clone(), directory);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    RemoteServices::new(&base_url, &base_url, &base_url, Duration::from_secs(5)).unwrap()
}

fn new_user(mail: &str) -> NewUser {
    NewUser {
        name: "Ivan".to_string(),
        surname: "Ivanov".to_string(),
        mail: mail.to_string(),
        password: "correct horse battery".to_string(),
        about: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_round_trip_over_rpc() {
        let remote = spawn_services().await;

        let author = remote.sign_up(new_user("ivan@example.com")).await.unwrap();
        let fan = remote.sign_up(new_user("fan@example.com")).await.unwrap();
        assert_eq!(
            remote
                .sign_in("ivan@example.com", "correct horse battery")
                .await
                .unwrap(),
            author
        );

        remote.subscribe(&author, &fan).await.unwrap();
        assert!(remote.is_subscribed(&author, &fan).await.unwrap());
        let subscribers: Vec<User> = remote.get_subscribers(&author).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].id, fan);

        let event_id = remote
            .create_event(Event {
                title: "Rust meetup".to_string(),
                city: "Moscow".to_string(),
                author_id: author.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        remote.visit(&event_id, &fan).await.unwrap();

        let listed = remote
            .get_events(EventFilter {
                city: Some("moscow".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(remote.get_cities().await.unwrap(), vec!["Moscow".to_string()]);
        assert_eq!(remote.get_visitors(&event_id).await.unwrap()[0].id, fan);
    }

    #[tokio::test]
    async fn domain_errors_keep_their_kind() {
        let remote = spawn_services().await;

        assert_eq!(
            remote.get_user_by_id("999").await,
            Err(ServiceError::NotFound)
        );
        assert_eq!(
            remote.sign_in("nobody@example.com", "whatever1").await,
            Err(ServiceError::Forbidden)
        );
        assert!(matches!(
            remote.get_event_by_id("not-a-number").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn only_the_author_edits_remotely() {
        let remote = spawn_services().await;
        let author = remote.sign_up(new_user("ivan@example.com")).await.unwrap();
        let other = remote.sign_up(new_user("olga@example.com")).await.unwrap();

        let event_id = remote
            .create_event(Event {
                title: "Rust meetup".to_string(),
                author_id: author.clone(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            remote.delete_event(&event_id, &other).await,
            Err(ServiceError::Forbidden)
        );
        remote.delete_event(&event_id, &author).await.unwrap();
        assert_eq!(
            remote.get_event_by_id(&event_id).await,
            Err(ServiceError::NotFound)
        );
    }
}
