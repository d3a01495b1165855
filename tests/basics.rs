use lifecycle_di::{Constructor, Container, DiError, Resolver, StoragePolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_concrete_singleton() {
    #[derive(Default)]
    struct Settings;

    let container = Container::new();
    container
        .register_type::<Settings>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();

    let s1 = container.resolve::<Settings>().unwrap();
    let s2 = container.resolve::<Settings>().unwrap();
    assert!(Arc::ptr_eq(&s1, &s2)); // Same instance
    assert!(container.has_singleton::<Settings>());
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let container = Container::new();
    container
        .register_type::<Config>(StoragePolicy::GlobalSingleton)
        .with_factory(|_| Config { port: 8080 })
        .register();
    container
        .register_type::<Server>(StoragePolicy::IsolatedInstance)
        .with_factory(|r| Server {
            config: r.resolve_required::<Config>(),
            name: "MyServer".to_string(),
        })
        .register();

    let server = container.resolve::<Server>().unwrap();
    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");

    let again = container.resolve::<Server>().unwrap();
    assert!(!Arc::ptr_eq(&server, &again));
    assert!(Arc::ptr_eq(&server.config, &again.config));
}

#[test]
fn test_isolated_creates_new_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    struct Ticket(usize);

    let container = Container::new();
    container
        .register_type::<Ticket>(StoragePolicy::IsolatedInstance)
        .with_factory(move |_| Ticket(counter_clone.fetch_add(1, Ordering::SeqCst)))
        .register();

    let a = container.resolve::<Ticket>().unwrap();
    let b = container.resolve::<Ticket>().unwrap();
    assert_eq!(a.0, 0);
    assert_eq!(b.0, 1);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(container.singleton_count(), 0);
}

#[test]
fn test_trait_resolution_through_cast() {
    trait Logger: Send + Sync {
        fn prefix(&self) -> &'static str;
    }

    #[derive(Default)]
    struct ConsoleLogger;
    impl Logger for ConsoleLogger {
        fn prefix(&self) -> &'static str {
            "[console]"
        }
    }

    let container = Container::new();
    container
        .register_type::<ConsoleLogger>(StoragePolicy::GlobalSingleton)
        .with_default()
        .as_type::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
        .register();

    let logger = container.resolve::<dyn Logger>().unwrap();
    assert_eq!(logger.prefix(), "[console]");
    assert!(container.is_registered::<dyn Logger>());
    assert!(!container.is_registered::<ConsoleLogger>());
}

#[test]
fn test_constructors_tried_fewest_parameters_first() {
    #[derive(Default)]
    struct Dep;

    struct Widget {
        built_with: usize,
    }

    let container = Container::new();
    container
        .register_type::<Dep>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();
    container
        .register_type::<Widget>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::binary(|_: Arc<Dep>, _: Arc<Dep>| Widget { built_with: 2 }))
        .with_constructor(Constructor::nullary(|| Widget { built_with: 0 }))
        .with_constructor(Constructor::unary(|_: Arc<Dep>| Widget { built_with: 1 }))
        .register();

    assert_eq!(container.resolve::<Widget>().unwrap().built_with, 0);
}

#[test]
fn test_unresolvable_constructor_is_skipped() {
    struct Missing;
    #[derive(Default)]
    struct Present;

    struct Widget {
        built_with: &'static str,
    }

    let container = Container::new();
    container
        .register_type::<Present>(StoragePolicy::IsolatedInstance)
        .with_default()
        .register();
    container
        .register_type::<Widget>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(|_: Arc<Missing>| Widget { built_with: "missing" }))
        .with_constructor(Constructor::binary(|_: Arc<Present>, _: Arc<Present>| Widget { built_with: "present" }))
        .register();

    assert_eq!(container.resolve::<Widget>().unwrap().built_with, "present");
}

#[test]
fn test_no_usable_constructor() {
    struct Missing;
    struct Widget;
    struct Bare;

    let container = Container::new();
    container
        .register_type::<Widget>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(|_: Arc<Missing>| Widget))
        .register();
    container.register_type::<Bare>(StoragePolicy::IsolatedInstance).register();

    assert!(matches!(container.resolve::<Widget>(), Err(DiError::NoUsableConstructor(_))));
    assert!(matches!(container.resolve::<Bare>(), Err(DiError::NoUsableConstructor(_))));
}

#[test]
fn test_factory_is_final() {
    // A failing factory does not fall back to the registered constructors
    #[derive(Default)]
    struct Connection;

    let container = Container::new();
    container
        .register_type::<Connection>(StoragePolicy::IsolatedInstance)
        .with_default()
        .with_try_factory(|_| Err(DiError::construction::<Connection>("refused")))
        .register();

    match container.resolve::<Connection>() {
        Err(DiError::ConstructionFailed { reason, .. }) => assert_eq!(reason, "refused"),
        other => panic!("expected ConstructionFailed, got {:?}", other.err()),
    }
}

#[test]
fn test_try_factory_wraps_dependency_errors() {
    struct Unregistered;
    struct Service;

    let container = Container::new();
    container
        .register_type::<Service>(StoragePolicy::IsolatedInstance)
        .with_try_factory(|r| {
            r.resolve::<Unregistered>()?;
            Ok(Service)
        })
        .register();

    match container.resolve::<Service>() {
        Err(DiError::ConstructionFailed { concrete, reason }) => {
            assert!(concrete.ends_with("Service"));
            assert!(reason.contains("No registered contracts"));
        }
        other => panic!("expected ConstructionFailed, got {:?}", other.err()),
    }
}

#[test]
fn test_constructor_panic_is_contained() {
    struct Fragile;

    let container = Container::new();
    container
        .register_type::<Fragile>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::nullary(|| -> Fragile { panic!("constructor exploded") }))
        .register();

    match container.resolve::<Fragile>() {
        Err(DiError::ConstructionFailed { reason, .. }) => assert!(reason.contains("constructor exploded")),
        other => panic!("expected ConstructionFailed, got {:?}", other.err()),
    }
    // The container keeps working
    assert!(container.resolve::<Fragile>().is_err());
}

#[test]
fn test_not_registered() {
    let container = Container::new();
    match container.resolve::<u64>() {
        Err(DiError::NotRegistered(name)) => assert_eq!(name, "u64"),
        other => panic!("expected NotRegistered, got {:?}", other.err()),
    }
}

#[test]
fn test_clone_shares_state() {
    #[derive(Default)]
    struct Settings;

    let container = Container::new();
    let clone = container.clone();
    container
        .register_type::<Settings>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();

    let a = container.resolve::<Settings>().unwrap();
    let b = clone.resolve::<Settings>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_explicit_singleton_management() {
    struct Preloaded(u8);

    let container = Container::new();
    container
        .register_type::<Preloaded>(StoragePolicy::GlobalSingleton)
        .with_factory(|_| Preloaded(1))
        .register();

    let preloaded = Arc::new(Preloaded(7));
    container.create_singleton_instance(preloaded.clone());
    let resolved = container.resolve::<Preloaded>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &preloaded));

    assert!(container.remove_singleton_instance::<Preloaded>());
    assert!(!container.remove_singleton_instance::<Preloaded>());
    assert_eq!(container.resolve::<Preloaded>().unwrap().0, 1);
}
