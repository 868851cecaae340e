use exthost_core::module::{LoadError, ModuleId, ModuleIdError, ModuleLoader, StaticModule};
use exthost_core::{ConfigurationError, ExportProvider, Registry, StaticModuleLoader};
use std::sync::Arc;

trait Linter: Send + Sync {}

struct NoopLinter;

impl Linter for NoopLinter {}

fn catalog() -> StaticModuleLoader {
    let publisher = "abcdef0123456789";
    let core = StaticModule::new(
        ModuleId::new("exthost.core")
            .and_then(|id| id.with_version("1.2.0"))
            .and_then(|id| id.with_publisher(publisher))
            .expect("valid core id"),
    )
    .export::<dyn Linter, _>(|| Ok(Arc::new(NoopLinter) as Arc<dyn Linter>));
    let extra = StaticModule::new(ModuleId::new("exthost.extra").expect("valid extra id"))
        .export::<dyn Linter, _>(|| Ok(Arc::new(NoopLinter) as Arc<dyn Linter>));

    StaticModuleLoader::new()
        .with_module(core.into_handle())
        .and_then(|loader| loader.with_module(extra.into_handle()))
        .expect("catalog has no duplicates")
}

#[test]
fn registry_composes_named_modules_in_order() {
    let loader = catalog();
    let registry = Registry::from_module_names(
        &["exthost.extra", "exthost.core@1.2.0#abcdef0123456789"],
        &loader,
    )
    .expect("names are valid");

    let origins: Vec<String> = registry
        .get_exports::<dyn Linter>()
        .map(|export| export.origin().name().to_string())
        .collect();
    assert_eq!(origins, vec!["exthost.extra", "exthost.core"]);
}

#[test]
fn mismatched_version_or_publisher_is_not_loaded() {
    let loader = catalog();

    let version = ModuleId::parse("exthost.core@2.0.0").expect("valid id");
    assert!(matches!(
        loader.load(&version).err().expect("version mismatch"),
        LoadError::VersionMismatch { .. }
    ));

    let publisher = ModuleId::parse("exthost.core#0000000000000000").expect("valid id");
    assert!(matches!(
        loader.load(&publisher).err().expect("publisher mismatch"),
        LoadError::PublisherMismatch { .. }
    ));

    let registry =
        Registry::from_module_ids(&[version, publisher], &loader).expect("ids are not empty");
    assert_eq!(registry.get_exports::<dyn Linter>().count(), 0);
}

#[test]
fn unpinned_request_matches_any_registered_version() {
    let loader = catalog();
    let module = loader
        .load(&ModuleId::new("exthost.core").expect("valid id"))
        .ok()
        .expect("unpinned lookup resolves");
    assert_eq!(module.id().version(), Some("1.2.0"));
}

#[test]
fn empty_and_invalid_configuration_fail_the_call() {
    let loader = catalog();

    let err = Registry::from_module_names(&[], &loader).expect_err("empty list fails");
    assert_eq!(err, ConfigurationError::EmptyModuleList);

    let err = Registry::from_module_names(&["exthost.core@one"], &loader)
        .expect_err("bad version fails");
    assert_eq!(
        err,
        ConfigurationError::InvalidModuleId(ModuleIdError::InvalidFormat(
            "exthost.core@one".to_string()
        ))
    );
}
