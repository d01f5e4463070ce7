//! Scoped connection to the FreeTalk document store.

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AuditError;

/// Used when the endpoint URI names no database.
const DEFAULT_DATABASE: &str = "freetalk";

/// An open connection to the document store.
///
/// Acquired once by the driver and closed on every exit path.
pub struct StoreSession {
    client: Client,
    database: Database,
}

impl StoreSession {
    /// Parse the configured endpoint and verify the store is reachable.
    ///
    /// An unparseable endpoint is a configuration error; a store that does
    /// not answer a ping within the connect timeout is a connection error.
    pub async fn connect(config: &Config) -> Result<Self, AuditError> {
        let mut options = ClientOptions::parse(&config.store_endpoint)
            .await
            .map_err(|e| AuditError::Config(format!("invalid STORE_ENDPOINT: {e}")))?;
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options).map_err(|e| AuditError::Connect(e.into()))?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));

        // The driver connects lazily; ping so an unreachable store fails
        // here, inside the connect timeout, rather than mid-query.
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AuditError::Connect(e.into()))?;
        info!(database = %database.name(), "connected to document store");

        Ok(Self { client, database })
    }

    /// Handle to the database named in the endpoint URI.
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    /// Close the connection. Safe to call after a failed run.
    pub async fn close(self) {
        debug!("closing document store session");
        self.client.shutdown().await;
    }
}
