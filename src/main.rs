use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

use broadcast::{
    application::{
        handlers::{chunk_expander::ChunkExpandHandler, delivery::DeliveryHandler},
        usecases::{
            campaign_progress::CampaignProgressUseCase,
            create_campaign::CreateCampaignUseCase,
            dispatch_draft::{DispatchConfig, DispatchDraftUseCase},
            dispatch_scheduled::DispatchScheduledUseCase,
            list_recipients::ListRecipientsUseCase,
            notify_recipient::NotifyRecipientUseCase,
            register_recipient::RegisterRecipientUseCase,
        },
    },
    config::Config,
    domain::repositories::{CampaignStore, RecipientDirectory},
    infrastructure::{
        messaging::{jetstream::JetstreamBus, telegram::TelegramSender},
        repositories::{
            in_memory::{InMemoryCampaignStore, InMemoryRecipientDirectory},
            postgres::{PostgresCampaignStore, PostgresRecipientDirectory},
        },
    },
    presentation::http::endpoints::{
        campaigns::CampaignsEndpoints,
        recipients::RecipientsEndpoints,
        root::{ApiState, Endpoints},
    },
};

#[main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_parse().map_err(|err| anyhow::anyhow!(err))?;

    let (campaigns, directory): (Arc<dyn CampaignStore>, Arc<dyn RecipientDirectory>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
                (
                    PostgresCampaignStore::new(pool.clone()),
                    PostgresRecipientDirectory::new(pool),
                )
            }
            None => {
                info!("DATABASE_URL not set, using in-memory repositories");
                (
                    Arc::new(InMemoryCampaignStore::new()),
                    Arc::new(InMemoryRecipientDirectory::new()),
                )
            }
        };

    let sender = TelegramSender::new(config.telegram_token.clone());

    let (bus, chunk_worker, send_worker) =
        JetstreamBus::connect(&config.jetstream, config.backoff).await?;

    let chunk_handler = Arc::new(ChunkExpandHandler::new(
        campaigns.clone(),
        directory.clone(),
        bus.clone(),
        config.send_max_attempts,
    ));
    let delivery_handler = Arc::new(DeliveryHandler::new(
        campaigns.clone(),
        directory.clone(),
        sender.clone(),
    ));

    let _chunk_worker = chunk_worker.spawn(chunk_handler, bus.clone());
    let _send_worker = send_worker.spawn(delivery_handler, bus.clone());

    let dispatch_config = DispatchConfig {
        chunk_size: config.chunk_size,
    };

    let state = Arc::new(ApiState {
        create_campaign_usecase: Arc::new(CreateCampaignUseCase::new(campaigns.clone())),
        campaign_progress_usecase: Arc::new(CampaignProgressUseCase::new(
            campaigns.clone(),
            directory.clone(),
        )),
        dispatch_draft_usecase: Arc::new(DispatchDraftUseCase::new(
            campaigns.clone(),
            directory.clone(),
            bus.clone(),
            dispatch_config,
        )),
        dispatch_scheduled_usecase: Arc::new(DispatchScheduledUseCase::new(
            campaigns.clone(),
            directory.clone(),
            bus.clone(),
            dispatch_config,
        )),
        register_recipient_usecase: Arc::new(RegisterRecipientUseCase::new(directory.clone())),
        list_recipients_usecase: Arc::new(ListRecipientsUseCase::new(directory.clone())),
        notify_recipient_usecase: Arc::new(NotifyRecipientUseCase::new(
            directory.clone(),
            sender.clone(),
        )),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    info!("starting server at {server_url}");

    let api_service = OpenApiService::new(
        (
            Endpoints,
            CampaignsEndpoints::new(state.clone()),
            RecipientsEndpoints::new(state),
        ),
        "Broadcast API",
        "0.1.0",
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("localhost:{}", config.port)))
        .run(app)
        .await?;
    Ok(())
}
