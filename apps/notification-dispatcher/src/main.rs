//! Notification Dispatcher
//!
//! Binary entry point.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();
    notification_dispatcher::run().await
}
