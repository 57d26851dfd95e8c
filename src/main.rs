use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{error, info, warn};

mod bindings;
mod config;
mod error;
mod events;
mod launcher;
mod services;
mod utils;

use config::Settings;
use events::LauncherEvent;
use launcher::Launcher;
use services::{create_desktop_services, create_hotkey_listener, WindowWatcher};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "hotlaunch")]
#[command(about = "Запуск приложений и переключение между их окнами по горячим клавишам")]
struct Args {
    /// Путь к файлу настроек
    #[arg(short, long, default_value = "hotlaunch.toml")]
    config: String,

    /// Путь к файлу привязок (вместо bindings.path из настроек)
    #[arg(short, long)]
    bindings: Option<PathBuf>,

    /// Режим сухого запуска (эмулированные окна и клавиатура)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (вместо logging.level из настроек)
    #[arg(long)]
    log_level: Option<String>,

    /// Проверить настройки и привязки, вывести таблицу клавиш и выйти
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(&args.config)?;
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }
    if let Some(path) = &args.bindings {
        settings.bindings.path = Some(path.clone());
    }
    settings.validate()?;

    init_tracing(&settings)?;
    info!("Запуск hotlaunch v{}", env!("CARGO_PKG_VERSION"));
    info!("Настройки загружены из: {}", args.config);

    // Без файла привязок работать нельзя
    let bindings_path = settings.bindings_path()?;
    let parsed = bindings::load_or_create(&bindings_path)?;

    if args.check {
        for warning in &parsed.warnings {
            println!("! {}", warning);
        }
        let keymap = parsed.into_keymap();
        for (hotkey, action) in keymap.bindings() {
            println!("{:<16} {}", hotkey.to_string(), action);
        }
        println!("win_center_mouse: {}", keymap.center_mouse || settings.window.center_mouse);
        return Ok(());
    }

    let mut keymap = parsed.into_keymap();
    keymap.center_mouse |= settings.window.center_mouse;
    let keymap = Arc::new(keymap);

    if args.dry_run {
        warn!("Режим сухого запуска - окна и нажатия эмулируются");
    } else {
        utils::permissions::check_permissions()?;
    }

    let services = create_desktop_services(&settings, args.dry_run)?;
    let mut launcher = Launcher::new(
        services.window_system.clone(),
        services.app_info.clone(),
        &keymap,
    );
    let snapshot = launcher.bootstrap();
    info!(
        "Привязанные приложения: {:?}, указатель в центр окна: {}",
        launcher.bound_ids(),
        launcher.center_pointer()
    );

    let (tx, mut rx) = mpsc::channel::<LauncherEvent>(EVENT_CHANNEL_CAPACITY);

    let hotkey_listener = create_hotkey_listener(&settings, keymap.clone(), tx.clone(), args.dry_run)?;
    let window_watcher = WindowWatcher::new(
        services.window_system.clone(),
        tx,
        Duration::from_millis(settings.window.polling_interval_ms),
        snapshot,
    );

    let hotkey_handle = tokio::spawn(async move {
        if let Err(e) = hotkey_listener.run().await {
            error!("Ошибка в HotkeyListener: {}", e);
        }
    });
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = window_watcher.run().await {
            error!("Ошибка в WindowWatcher: {}", e);
        }
    });

    info!("Все сервисы запущены, {} привязок", keymap.len());

    // События обрабатываются строго по одному в порядке поступления
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => launcher.handle_event(event),
                None => {
                    warn!("Все источники событий остановились");
                    break;
                }
            },
            result = &mut shutdown => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(e) => error!("Ошибка при ожидании сигнала завершения: {}", e),
                }
                break;
            }
        }
    }

    info!("Завершение работы...");
    drop(rx);

    hotkey_handle.abort();
    watcher_handle.abort();

    let shutdown_result = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = hotkey_handle.await;
        let _ = watcher_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    launcher.shutdown();
    info!("hotlaunch завершил работу");
    Ok(())
}

fn init_tracing(settings: &Settings) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let mut directives = format!("warn,hotlaunch={}", settings.logging.level);
    if !settings.logging.filter.is_empty() {
        directives.push(',');
        directives.push_str(&settings.logging.filter);
    }

    // RUST_LOG важнее настроек
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directives))?;

    let registry = tracing_subscriber::registry().with(filter);
    match settings.logging.format.as_str() {
        "json" => registry.with(fmt::layer().json()).init(),
        _ => registry.with(fmt::layer().compact()).init(),
    }

    Ok(())
}
