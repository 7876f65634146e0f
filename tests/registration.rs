//! Registration and resolution against configuration files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use client_setup::options::OptionsRegistry;
use client_setup::registration::{Container, Lifetime};
use client_setup::OptionsRecord;

mod common;

use common::{region, runner, store_client, FunctionRunner, MockStore, ObjectStore, TempConfig};

fn container_from(config: &TempConfig) -> Container {
    let options = OptionsRegistry::load_file(config.path(), Some("Clients")).unwrap();
    let container = Container::new();
    container.set_default_options(options);
    container
}

#[test]
fn test_inject_client_with_default_config() {
    let config = TempConfig::new("clients.json", common::CLIENT_CONFIG);
    let container = container_from(&config);
    container.binder().bind::<dyn ObjectStore>(store_client, None);

    let store = container.resolve::<dyn ObjectStore>().unwrap();
    assert_eq!(store.kind(), "client");
    assert_eq!(store.options().region(), Some(&region("us-west-2")));
    assert_eq!(store.options().credentials().profile_name(), Some("default"));
}

#[test]
fn test_inject_client_with_overriding_config() {
    let config = TempConfig::new("clients.json", common::CLIENT_CONFIG);
    let container = container_from(&config);
    container.binder().bind::<dyn ObjectStore>(store_client, None);
    container
        .binder()
        .bind::<dyn ObjectStore>(store_client, Some(OptionsRecord::new().with_region(region("eu-central-1"))));

    let store = container.resolve::<dyn ObjectStore>().unwrap();
    assert_eq!(store.options().region(), Some(&region("eu-central-1")));
    // Overrides are used verbatim, nothing is inherited from the default.
    assert!(store.options().credentials().profile_name().is_none());
}

#[test]
fn test_bind_if_absent_keeps_preregistered_mock() {
    let config = TempConfig::new("clients.json", common::CLIENT_CONFIG);
    let mock: Arc<dyn ObjectStore> = Arc::new(MockStore::new());

    let container = Container::new();
    container.binder().add_instance::<dyn ObjectStore>(mock.clone());
    container.set_default_options(OptionsRegistry::load_file(config.path(), Some("Clients")).unwrap());

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let registered = container.binder().bind_if_absent::<dyn ObjectStore>(
        move |options| {
            seen.fetch_add(1, Ordering::SeqCst);
            store_client(options)
        },
        Some(OptionsRecord::new().with_region(region("eu-central-1"))),
    );
    assert!(!registered);

    let store = container.resolve::<dyn ObjectStore>().unwrap();
    assert_eq!(store.kind(), "mock");
    assert!(Arc::ptr_eq(&store, &mock));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_bind_always_replaces() {
    let container = Container::new();
    container.binder().add_instance::<dyn ObjectStore>(Arc::new(MockStore::new()));
    container.binder().bind::<dyn ObjectStore>(store_client, None);

    let store = container.resolve::<dyn ObjectStore>().unwrap();
    assert_eq!(store.kind(), "client");
}

#[test]
fn test_override_wins_over_default_in_any_order() {
    let override_options = OptionsRecord::new().with_region(region("eu-central-1"));

    let before = Container::new();
    before.set_default_options(OptionsRecord::new().with_region(region("us-west-2")));
    before.binder().bind::<dyn ObjectStore>(store_client, Some(override_options.clone()));

    let after = Container::new();
    after.binder().bind::<dyn ObjectStore>(store_client, Some(override_options.clone()));
    after.set_default_options(OptionsRecord::new().with_region(region("us-west-2")));

    for container in [before, after] {
        let store = container.resolve::<dyn ObjectStore>().unwrap();
        assert_eq!(store.options(), &override_options);
    }
}

#[test]
fn test_service_block_and_builtin_defaults() {
    let config = TempConfig::new("clients.json", common::CLIENT_CONFIG);

    // The Lambda block in the file overrides the default region.
    let configured = container_from(&config);
    configured.binder().bind::<dyn FunctionRunner>(runner, None);
    let function = configured.resolve::<dyn FunctionRunner>().unwrap();
    assert_eq!(function.options().region(), Some(&region("eu-west-1")));

    // Without any default the capability's built-in options are used.
    let bare = Container::new();
    bare.binder().bind::<dyn FunctionRunner>(runner, None);
    let function = bare.resolve::<dyn FunctionRunner>().unwrap();
    assert_eq!(function.options().region(), Some(&region("sa-east-1")));
}

#[test]
fn test_transient_registration() {
    let container = Container::new();
    container
        .binder()
        .bind_if_absent_with_lifetime::<dyn ObjectStore>(store_client, None, Lifetime::Transient);

    let a = container.resolve::<dyn ObjectStore>().unwrap();
    let b = container.resolve::<dyn ObjectStore>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_unregistered_capability() {
    let container = Container::new();
    let err = container.resolve::<dyn ObjectStore>().err().unwrap();
    assert!(err.to_string().contains("ObjectStore"));
}

#[test]
fn test_factory_builds_with_given_options() {
    let container = Container::new();
    container.binder().bind::<dyn ObjectStore>(store_client, None);

    let options = OptionsRecord::new().with_region(region("ap-southeast-2"));
    let store = container.factory().create::<dyn ObjectStore>(options.clone()).unwrap();
    assert_eq!(store.options(), &options);
}

#[test]
fn test_parse_from_file_is_deterministic() {
    let config = TempConfig::new("clients.json", common::CLIENT_CONFIG);
    let first = OptionsRegistry::load_file(config.path(), Some("Clients")).unwrap();
    let second = OptionsRegistry::load_file(config.path(), Some("Clients")).unwrap();
    assert_eq!(first, second);
}
