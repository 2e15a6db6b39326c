//! Demo client: signs in, subscribes to the user's items and walks one item
//! through create, update and delete against the in-process adapters.

use std::sync::Arc;

use color_eyre::eyre::{eyre, Result};
use serde_json::json;
use tokio::sync::watch;

use livesync::adapters::{InMemoryDocumentStore, MockIdentityProvider};
use livesync::logging::init_tracing;
use livesync::models::{CollectionView, Fields, ItemId, UserIdentity};
use livesync::{CollectionSync, SessionManager, SyncConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn payload(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn print_view(label: &str, view: &CollectionView) {
    println!("{} ({} items)", label, view.len());
    for item in &view.items {
        println!(
            "  {}  {}  {}",
            item.created_at.format("%H:%M:%S%.3f"),
            item.id,
            item.get_str("title").unwrap_or("<untitled>")
        );
    }
}

async fn settled(
    views: &mut watch::Receiver<CollectionView>,
    mut done: impl FnMut(&CollectionView) -> bool,
) -> Result<CollectionView> {
    let view = views
        .wait_for(|view| !view.loading && done(view))
        .await
        .map_err(|_| eyre!("collection closed"))?;
    Ok(view.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = SyncConfig::from_env()?;
    init_tracing(&config.log_directive);
    println!("livesync demo v{}", VERSION);

    let provider = MockIdentityProvider::new();
    provider.set_sign_in_user(
        UserIdentity::new("demo-user").with_display_name("Demo User"),
        "demo-access-token",
    );
    let store = InMemoryDocumentStore::new();

    let mut session = SessionManager::new(Arc::new(provider.clone()));
    session.init_auth();
    session
        .subscribe()
        .wait_for(|s| !s.loading)
        .await
        .map_err(|_| eyre!("session closed"))?;

    let (user, _token) = session.sign_in_with_google().await?;
    println!(
        "Signed in as {} ({})",
        user.display_name.as_deref().unwrap_or("unnamed"),
        user.uid
    );

    let mut sync = CollectionSync::new(Arc::new(store.clone()), session.subscribe(), &config);
    let mut views = sync.subscribe();
    sync.subscribe_to_items();
    print_view("Initial", &settled(&mut views, |_| true).await?);

    for title in ["first", "second"] {
        let id = sync
            .add_item(payload(json!({ "title": title })))
            .await?
            .ok_or_else(|| eyre!("not signed in"))?;
        let view = settled(&mut views, |view| view.contains(&id)).await?;
        print_view(&format!("Added {}", id), &view);
    }

    let newest: ItemId = sync
        .view()
        .items
        .first()
        .map(|item| item.id.clone())
        .ok_or_else(|| eyre!("no items"))?;

    sync.update_item(&newest, payload(json!({ "title": "second (edited)" })))
        .await?;
    let view = settled(&mut views, |view| {
        view.get(&newest)
            .and_then(|item| item.get_str("title"))
            .is_some_and(|title| title.ends_with("(edited)"))
    })
    .await?;
    print_view(&format!("Updated {}", newest), &view);

    sync.delete_item(&newest).await?;
    let view = settled(&mut views, |view| !view.contains(&newest)).await?;
    print_view(&format!("Deleted {}", newest), &view);

    session.sign_out_user().await?;
    sync.cleanup();
    session.cleanup();
    println!(
        "Signed out. Listeners left: auth={}, store={}",
        provider.active_listeners(),
        store.active_listeners()
    );

    Ok(())
}
