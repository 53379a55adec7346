use snake_arena::config::ServerConfig;
use snake_arena::game::room::Room;
use snake_arena::transport;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = ServerConfig::from_env()?;
  let room = Arc::new(Room::new(&config.settings));

  let address = format!("0.0.0.0:{}", config.port);
  let bound = transport::listen(address.as_str(), room.accept_handler()).await?;
  tracing::info!(
    world_size = config.settings.world_size,
    walls = config.settings.walls.len(),
    "listening on {bound}"
  );

  let game_loop = tokio::spawn(Arc::clone(&room).run());
  tokio::select! {
    result = game_loop => {
      if let Err(error) = result {
        tracing::error!(?error, "game loop stopped");
      }
    }
    _ = tokio::signal::ctrl_c() => {
      tracing::info!("shutting down");
    }
  }

  Ok(())
}
