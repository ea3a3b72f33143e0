//! LipaChat Agents server.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use lipachat_agents::adapters::ai::{AnthropicConfig, AnthropicProvider};
use lipachat_agents::adapters::http::{api_router, AppState, WebhookVerifier};
use lipachat_agents::adapters::knowledge::{
    HttpVectorStore, HttpVectorStoreConfig, InMemoryKnowledgeBase,
};
use lipachat_agents::adapters::messaging::{
    InMemoryMessagingTransport, LipaChatTransport, LipaChatTransportConfig,
};
use lipachat_agents::adapters::postgres::PostgresConversationStore;
use lipachat_agents::adapters::sentiment::{LexiconSentimentScorer, ModelSentimentScorer};
use lipachat_agents::adapters::storage::InMemoryConversationStore;
use lipachat_agents::application::{Collaborators, ExpirySweeper, Orchestrator, SentimentMonitor};
use lipachat_agents::config::{AppConfig, SentimentBackend, ServerConfig};
use lipachat_agents::domain::agents::{
    AgentRegistry, GeneralAgent, MarketingAgent, ModelSettings, SupportAgent,
};
use lipachat_agents::domain::escalation::EscalationPolicy;
use lipachat_agents::domain::knowledge::KnowledgeRetriever;
use lipachat_agents::domain::routing::RuleBasedIntentClassifier;
use lipachat_agents::ports::{
    AIProvider, ConversationStore, KnowledgeStore, MessagingTransport, SentimentScorer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.server);
    config.validate().context("invalid configuration")?;

    let provider: Arc<dyn AIProvider> = Arc::new(
        AnthropicProvider::new(
            AnthropicConfig::new(config.ai.anthropic_api_key.clone().unwrap_or_default())
                .with_model(&config.ai.model)
                .with_timeout(config.ai.timeout())
                .with_max_retries(config.ai.max_retries)
                .with_default_max_tokens(config.ai.max_tokens),
        )
        .context("failed to build AI provider")?,
    );

    let store = conversation_store(&config).await?;
    let transport = messaging_transport(&config)?;
    let knowledge = knowledge_store(&config)?;

    let scorer: Arc<dyn SentimentScorer> = match config.ai.sentiment_backend {
        SentimentBackend::Lexicon => Arc::new(LexiconSentimentScorer::new()),
        SentimentBackend::Model => Arc::new(ModelSentimentScorer::new(provider.clone())),
    };

    let model = ModelSettings {
        max_tokens: config.ai.max_tokens,
        temperature: config.ai.temperature,
    };
    let registry = AgentRegistry::new(Arc::new(GeneralAgent::new(provider.clone(), model.clone())))
        .with(Arc::new(SupportAgent::new(provider.clone(), model.clone())))
        .with(Arc::new(MarketingAgent::new(provider, model)));
    tracing::info!(categories = ?registry.registered_categories(), "agents registered");

    let orchestrator = Orchestrator::new(
        Collaborators {
            store: store.clone(),
            transport,
            classifier: Arc::new(RuleBasedIntentClassifier::new()),
            sentiment: SentimentMonitor::new(scorer, config.orchestration.sentiment_timeout()),
            policy: EscalationPolicy::new(config.orchestration.escalation_rules()),
            registry,
            retriever: KnowledgeRetriever::new(knowledge, config.knowledge.retrieval_settings()),
        },
        config.orchestration.orchestrator_settings(),
    );

    let mut state = AppState::new(Arc::new(orchestrator));
    match &config.messaging.webhook_secret {
        Some(secret) if config.messaging.has_webhook_secret() => {
            state = state.with_verifier(WebhookVerifier::new(
                secret.clone(),
                config.messaging.signature_tolerance_secs,
            ));
        }
        _ => tracing::warn!("no webhook secret configured; inbound signatures are not checked"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(store, config.orchestration.sweep_interval()).spawn(shutdown_rx);

    let app = api_router(state, config.server.request_timeout());
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, environment = ?config.server.environment, "lipachat-agents listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "expiry sweeper did not stop cleanly");
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn conversation_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ConversationStore>> {
    let ttl = config.orchestration.ttl();
    let language = config.orchestration.default_language.clone();

    if !config.database.is_configured() {
        tracing::warn!("no database configured; conversations are kept in memory");
        return Ok(Arc::new(
            InMemoryConversationStore::new()
                .with_ttl(ttl)
                .with_default_language(language),
        ));
    }

    let db = &config.database;
    let pool = PgPoolOptions::new()
        .min_connections(db.min_connections)
        .max_connections(db.max_connections)
        .acquire_timeout(db.acquire_timeout())
        .idle_timeout(db.idle_timeout())
        .max_lifetime(db.max_lifetime())
        .connect(&db.url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let store = PostgresConversationStore::new(pool, ttl, language);
    if db.run_migrations {
        store.migrate().await.context("migrations failed")?;
    }
    Ok(Arc::new(store))
}

fn messaging_transport(config: &AppConfig) -> anyhow::Result<Arc<dyn MessagingTransport>> {
    let messaging = &config.messaging;
    match &messaging.lipachat_api_key {
        Some(key) if messaging.has_api_key() => {
            let transport = LipaChatTransport::new(
                LipaChatTransportConfig::new(key.clone(), messaging.base_url.clone())
                    .with_timeout(messaging.timeout()),
            )
            .context("failed to build LipaChat transport")?;
            Ok(Arc::new(transport))
        }
        _ => {
            tracing::warn!("no LipaChat API key configured; replies are recorded in memory only");
            Ok(Arc::new(InMemoryMessagingTransport::new()))
        }
    }
}

fn knowledge_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    let knowledge = &config.knowledge;
    match knowledge.vector_store() {
        Some(url) => {
            let mut settings = HttpVectorStoreConfig::new(url).with_timeout(knowledge.timeout());
            if let Some(key) = knowledge.vector_store_api_key.as_deref().filter(|k| !k.is_empty()) {
                settings = settings.with_api_key(key);
            }
            Ok(Arc::new(
                HttpVectorStore::new(settings).context("failed to build vector store client")?,
            ))
        }
        None => Ok(Arc::new(InMemoryKnowledgeBase::seeded())),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
