use std::io;
use std::sync::Arc;

use chat_cli::app::{App, Flow};
use chat_cli::backends::backend_from_config;
use chat_cli::config::CliConfig;
use chat_cli::logging;
use client_store::{
    store_file_path, CredentialStore, FileStore, KeyValueStore, MemoryStore, Preferences,
};
use roognis_client::{ChatClient, ClientConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = CliConfig::from_env().map_err(io::Error::other)?;
    logging::init(config.log_file.as_deref())?;

    let backend = backend_from_config(&config).map_err(io::Error::other)?;
    let durable: Arc<dyn KeyValueStore> = match config.resolved_data_dir() {
        Some(data_dir) => {
            let path = store_file_path(&data_dir);
            info!(path = %path.display(), "using durable store");
            Arc::new(FileStore::new(path))
        }
        None => {
            warn!("no data directory available; preferences and tokens will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    let client = ChatClient::new(
        backend,
        CredentialStore::with_durable(Arc::clone(&durable)),
        ClientConfig::default().with_remember_credentials(config.remember_credentials),
    );
    let app = App::new(client, Preferences::new(durable));

    let mut stdout = io::stdout();
    app.start(&mut stdout).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        app.write_prompt(&mut stdout)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if app.handle_line(&line, &mut stdout).await? == Flow::Quit {
            break;
        }
    }
    Ok(())
}
