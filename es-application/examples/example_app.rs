//! 运行：`RUST_LOG=debug cargo run -p es-application --example example_app`
use es_application::{AppConfig, ExampleApplication};
use es_domain::entity::Entity;
use es_domain::persist::{Repository, SnapshotPolicy, XChaChaCipher};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::builder()
        .always_encrypt(true)
        .cipher_key(XChaChaCipher::generate_key())
        .snapshot_policy(SnapshotPolicy::Every(3))
        .build();
    let mut app = ExampleApplication::new(config)?;

    let example = app.create_new_example(10, 20).await?;
    let id = *example.id();
    tracing::info!(%id, a = example.a(), b = example.b(), "Created example");

    app.set_a(&id, 50).await?;
    app.set_b(&id, 70).await?;
    app.add_note(&id, "reviewed").await?;

    let current = app.example_repository().get(&id).await?;
    tracing::info!(version = current.version(), a = current.a(), b = current.b(), "Current state");

    if let Some(first) = app.example_repository().get_entity(&id, Some(0)).await? {
        tracing::info!(a = first.a(), b = first.b(), "State after first event");
    }

    let notes = app.notes(&id).await?;
    tracing::info!(?notes, "Notes");

    let records = app.integer_sequenced_records().all_records().await?;
    tracing::info!(records = records.len(), "Stored encrypted event records");

    app.close();
    Ok(())
}
