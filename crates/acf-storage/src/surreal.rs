//! `SurrealDB`-backed persistent [`SessionTier`], using an embedded
//! `SurrealKV` file-backed connection in production and an in-memory
//! connection for tests.

use acf_core::{FencingToken, Session, SessionKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;

use crate::error::{StorageError, StorageResult};
use crate::session::SessionTier;

/// Wraps a `SurrealDB` connection dedicated to ACF session state.
///
/// In embedded mode it uses `SurrealKV` as its storage engine; in tests it
/// uses the in-memory engine.
pub struct SurrealSessionTier {
    db: Surreal<Any>,
}

#[derive(Serialize, Deserialize)]
struct SessionRow {
    session_key: String,
    fencing_token: u64,
    session: Session,
}

impl SurrealSessionTier {
    /// Connect to an embedded `SurrealKV`-backed database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the connection fails.
    pub async fn connect_embedded(path: &str) -> StorageResult<Self> {
        let endpoint = format!("surrealkv://{path}");
        let db: Surreal<Any> = Surreal::init();
        db.connect(&endpoint)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        db.use_ns("acf")
            .use_db("sessions")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { db })
    }

    /// Connect to an in-memory database, for tests and the demo binary.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the connection fails.
    pub async fn connect_memory() -> StorageResult<Self> {
        let db: Surreal<Any> = Surreal::init();
        db.connect("mem://").await.map_err(|e| StorageError::Connection(e.to_string()))?;
        db.use_ns("acf")
            .use_db("sessions")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl SessionTier for SurrealSessionTier {
    async fn get(&self, key: &SessionKey) -> StorageResult<Option<Session>> {
        let mut result = self
            .db
            .query("SELECT * FROM session WHERE session_key = $key LIMIT 1")
            .bind(("key", key.as_canonical()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<SessionRow> = result.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(rows.into_iter().next().map(|r| r.session))
    }

    async fn put(&self, session: Session, token: FencingToken, _ttl: Option<chrono::Duration>) -> StorageResult<()> {
        let canonical = session.session_key.as_canonical();

        let mut existing = self
            .db
            .query("SELECT fencing_token FROM session WHERE session_key = $key LIMIT 1")
            .bind(("key", canonical.clone()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<serde_json::Value> = existing.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        if let Some(last_seen) = rows.first().and_then(|r| r.get("fencing_token")).and_then(serde_json::Value::as_u64)
        {
            if token.raw() <= last_seen {
                return Err(StorageError::FencingRegression {
                    key: session.session_key.clone(),
                    incoming: token.raw(),
                    last_seen,
                });
            }
        }

        self.db
            .query(
                "UPDATE session SET session_key = $key, fencing_token = $token, session = $session \
                 WHERE session_key = $key \
                 ELSE CREATE session SET session_key = $key, fencing_token = $token, session = $session",
            )
            .bind(("key", canonical))
            .bind(("token", token.raw()))
            .bind(("session", session))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> StorageResult<()> {
        self.db
            .query("DELETE session WHERE session_key = $key")
            .bind(("key", key.as_canonical()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn list_by_agent(&self, tenant_id: &str, agent_id: &str) -> StorageResult<Vec<Session>> {
        let mut result = self
            .db
            .query("SELECT * FROM session WHERE session.tenant_id = $tenant AND session.agent_id = $agent")
            .bind(("tenant", tenant_id.to_string()))
            .bind(("agent", agent_id.to_string()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<SessionRow> = result.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.session).collect())
    }

    async fn list_by_interlocutor(&self, tenant_id: &str, interlocutor_id: &str) -> StorageResult<Vec<Session>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM session WHERE session.tenant_id = $tenant \
                 AND session.interlocutor_id = $interlocutor",
            )
            .bind(("tenant", tenant_id.to_string()))
            .bind(("interlocutor", interlocutor_id.to_string()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<SessionRow> = result.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.session).collect())
    }

    async fn find_by_channel_identity(
        &self,
        tenant_id: &str,
        channel: &str,
        channel_identity: &str,
    ) -> StorageResult<Option<Session>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM session WHERE session.tenant_id = $tenant AND session.channel = $channel \
                 AND session.interlocutor_id = $identity LIMIT 1",
            )
            .bind(("tenant", tenant_id.to_string()))
            .bind(("channel", channel.to_string()))
            .bind(("identity", channel_identity.to_string()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<SessionRow> = result.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(rows.into_iter().next().map(|r| r.session))
    }

    async fn find_by_step_hash(&self, tenant_id: &str, step_hash: &str) -> StorageResult<Vec<Session>> {
        let mut result = self
            .db
            .query("SELECT * FROM session WHERE session.tenant_id = $tenant")
            .bind(("tenant", tenant_id.to_string()))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<SessionRow> = result.take(0).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|r| r.session)
            .filter(|s| {
                s.active_step_id
                    .as_deref()
                    .is_some_and(|step| blake3::hash(step.as_bytes()).to_hex().as_str() == step_hash)
            })
            .collect())
    }
}
