use anyhow::Context;
use hub_app::Hub;
use hub_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load hub settings")?;
    hub_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        credentials = %settings.firebase.credentials_path.display(),
        "hub-app bootstrap starting"
    );

    let hub = Hub::start(settings).await?;

    tracing::info!(
        project_id = %hub.firebase().app().project_id(),
        "hub-app bootstrap complete"
    );
    Ok(())
}
