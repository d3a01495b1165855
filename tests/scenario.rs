//! End-to-end walk through a global singleton registered under an interface
//! type and, later, under its own concrete type.

use lifecycle_di::{Container, DiError, InstanceId, Resolver, StoragePolicy};
use std::sync::Arc;

trait IAmSimple: Send + Sync {
    fn describe(&self) -> &'static str;
}

#[derive(Default)]
struct SimpleClass;

impl IAmSimple for SimpleClass {
    fn describe(&self) -> &'static str {
        "simple"
    }
}

fn register_as_interface(container: &Container) {
    container
        .register_type::<SimpleClass>(StoragePolicy::GlobalSingleton)
        .with_default()
        .as_type::<dyn IAmSimple, _>(|s| s as Arc<dyn IAmSimple>)
        .register();
}

#[test]
fn global_singleton_scenario() {
    let container = Container::new();
    register_as_interface(&container);

    let first = container.resolve::<dyn IAmSimple>().unwrap();
    assert_eq!(first.describe(), "simple");
    assert_eq!(container.singleton_count(), 1);

    let second = container.resolve::<dyn IAmSimple>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Not registered under its own type yet
    assert!(matches!(
        container.resolve::<SimpleClass>(),
        Err(DiError::NotRegistered(_))
    ));

    container
        .register_type::<SimpleClass>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();

    // Singletons are keyed by concrete type: both views share one instance
    let concrete = container.resolve::<SimpleClass>().unwrap();
    assert_eq!(InstanceId::of(&concrete), InstanceId::of(&first));
    assert_eq!(container.singleton_count(), 1);
}

#[test]
fn add_concrete_as_default_registers_both_views_at_once() {
    let container = Container::new();
    container
        .register_type::<SimpleClass>(StoragePolicy::GlobalSingleton)
        .with_default()
        .as_type::<dyn IAmSimple, _>(|s| s as Arc<dyn IAmSimple>)
        .add_concrete_as_default()
        .register();

    let concrete = container.resolve::<SimpleClass>().unwrap();
    let view = container.resolve::<dyn IAmSimple>().unwrap();
    assert_eq!(InstanceId::of(&concrete), InstanceId::of(&view));
    assert_eq!(container.contract_summaries().len(), 2);
}

#[test]
fn teardown_through_any_view_clears_the_singleton() {
    let container = Container::new();
    register_as_interface(&container);

    let first = container.resolve::<dyn IAmSimple>().unwrap();
    container.container_class_is_dying(&first);
    assert_eq!(container.singleton_count(), 0);

    let replacement = container.resolve::<dyn IAmSimple>().unwrap();
    assert!(!Arc::ptr_eq(&first, &replacement));
    assert_eq!(container.singleton_count(), 1);

    // Registration survives teardown
    assert!(container.is_registered::<dyn IAmSimple>());
}
