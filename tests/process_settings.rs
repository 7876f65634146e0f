//! The process-wide settings slot is the one the watcher reloads.
//!
//! Kept in its own test binary: it mutates process-global state.

use std::time::Duration;

use client_setup::config::{ConfigWatcher, WatchEvent, WatchOptions};
use client_setup::options::{LogTo, OptionsRegistry};
use client_setup::registration::Container;
use client_setup::settings::GlobalSettings;

mod common;

use common::{next_outcome, store_client, ObjectStore, TempConfig, LOG_TO_CONFIG};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_reloads_process_settings() {
    let config = TempConfig::new("app.json", LOG_TO_CONFIG);
    let options = OptionsRegistry::load_file(config.path(), None).unwrap();

    assert_eq!(GlobalSettings::process().log_to(), LogTo::NONE);
    let settings = GlobalSettings::process().clone();
    let before = settings.generation();

    let container = Container::new();
    container.set_default_options(options.clone().with_global_settings(settings.clone()));
    container.binder().bind::<dyn ObjectStore>(store_client, None);

    let watcher = ConfigWatcher::start(
        config.path(),
        &options,
        settings,
        WatchOptions::default().with_debounce(Duration::from_millis(150)),
    )
    .unwrap();
    assert_eq!(GlobalSettings::process().log_to(), LogTo::CONSOLE);
    assert_eq!(GlobalSettings::process().generation(), before + 1);

    let store = container.resolve::<dyn ObjectStore>().unwrap();
    let mut events = watcher.subscribe();
    config.write(r#"{ "Region": "us-west-2", "LogTo": "Console,Log4Net" }"#);
    assert!(matches!(next_outcome(&mut events).await, WatchEvent::Applied { .. }));

    let expected = LogTo::CONSOLE | LogTo::LOG4NET;
    assert_eq!(GlobalSettings::process().log_to(), expected);
    assert_eq!(GlobalSettings::process().load().logging.log_to, expected);
    assert!(store
        .options()
        .global_settings()
        .unwrap()
        .ptr_eq(GlobalSettings::process()));
    assert_eq!(store.options().log_to(), expected);

    watcher.stop().await;
}
