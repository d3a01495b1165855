use lifecycle_di::{Constructor, Container, ContainerConfig, DiError, Resolver, StoragePolicy};
use std::sync::Arc;

struct PageA {
    _b: Arc<PageB>,
}

struct PageB {
    _a: Arc<PageA>,
}

#[test]
fn test_constructor_cycle_fails_fast_with_path() {
    let container = Container::new();
    container
        .register_type::<PageA>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(|b: Arc<PageB>| PageA { _b: b }))
        .register();
    container
        .register_type::<PageB>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(|a: Arc<PageA>| PageB { _a: a }))
        .register();

    // Not swallowed as "no usable constructor"
    match container.resolve::<PageA>() {
        Err(DiError::CircularDependency(path)) => {
            assert_eq!(path.len(), 3);
            assert!(path[0].ends_with("PageA"));
            assert!(path[1].ends_with("PageB"));
            assert!(path[2].ends_with("PageA"));
        }
        other => panic!("expected CircularDependency, got {:?}", other.err()),
    }
}

#[test]
fn test_try_factory_cycle_propagates() {
    let container = Container::new();
    container
        .register_type::<PageA>(StoragePolicy::GlobalSingleton)
        .with_try_factory(|r| Ok(PageA { _b: r.resolve::<PageB>()? }))
        .register();
    container
        .register_type::<PageB>(StoragePolicy::GlobalSingleton)
        .with_try_factory(|r| Ok(PageB { _a: r.resolve::<PageA>()? }))
        .register();

    assert!(matches!(
        container.resolve::<PageA>(),
        Err(DiError::CircularDependency(_))
    ));
    // Nothing half-built was cached
    assert_eq!(container.singleton_count(), 0);
}

#[test]
fn test_panicking_factory_cycle_is_reported() {
    let container = Container::new();
    container
        .register_type::<PageA>(StoragePolicy::IsolatedInstance)
        .with_factory(|r| PageA { _b: r.resolve_required::<PageB>() })
        .register();
    container
        .register_type::<PageB>(StoragePolicy::IsolatedInstance)
        .with_factory(|r| PageB { _a: r.resolve_required::<PageA>() })
        .register();

    match container.resolve::<PageA>() {
        Err(DiError::ConstructionFailed { reason, .. }) => assert!(reason.contains("Circular dependency")),
        other => panic!("expected ConstructionFailed, got {:?}", other.err()),
    }
}

#[test]
fn test_depth_limit() {
    #[derive(Default)]
    struct Level3;
    struct Level2(#[allow(dead_code)] Arc<Level3>);
    struct Level1(#[allow(dead_code)] Arc<Level2>);

    let container = Container::with_config(ContainerConfig::default().max_resolution_depth(2));
    container
        .register_type::<Level3>(StoragePolicy::IsolatedInstance)
        .with_default()
        .register();
    container
        .register_type::<Level2>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(Level2))
        .register();
    container
        .register_type::<Level1>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(Level1))
        .register();

    assert!(container.resolve::<Level2>().is_ok());
    assert!(matches!(container.resolve::<Level1>(), Err(DiError::DepthExceeded(2))));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    #[derive(Default)]
    struct Shared;
    struct Left(#[allow(dead_code)] Arc<Shared>);
    struct Right(#[allow(dead_code)] Arc<Shared>);
    struct Top {
        left: Arc<Left>,
        right: Arc<Right>,
    }

    let container = Container::new();
    container
        .register_type::<Shared>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();
    container
        .register_type::<Left>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(Left))
        .register();
    container
        .register_type::<Right>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(Right))
        .register();
    container
        .register_type::<Top>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::binary(|left: Arc<Left>, right: Arc<Right>| Top { left, right }))
        .register();

    let top = container.resolve::<Top>().unwrap();
    assert!(Arc::ptr_eq(&top.left.0, &top.right.0));
}
