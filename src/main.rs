use invoice_editor_rust::{create_pool, router, AppConfig, AppState};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = AppConfig::load()?;

    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(config.log_level())
        .init();

    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池 (首次查询时建立连接)
    let pool = create_pool(&config.database)?;
    info!("Database pool created");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(AppState::new(config, pool));

    // 启动服务器
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/sessions                    - open an editor session");
    info!("  POST /api/sessions/:id/reorder        - drag and drop");
    info!("  POST /api/sessions/:id/draft          - save as draft");
    info!("  GET  /api/drafts                      - list drafts");
    info!("  GET  /api/catalog/products?q=         - product picker");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
