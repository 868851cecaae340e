use exthost_core::composition::{CompositionIssue, ContractKey, ExportDeclaration, ExportFactory};
use exthost_core::module::{ModuleHandle, ModuleId, StaticModule};
use exthost_core::{CompositionContext, ExportProvider, Registry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

trait Widget: Send + Sync {
    fn label(&self) -> String;
}

trait Gadget: Send + Sync {}

struct Named(&'static str);

impl Widget for Named {
    fn label(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Serialize)]
struct NameRecord {
    name: &'static str,
}

#[derive(Debug, Deserialize, PartialEq)]
struct NameView {
    name: String,
}

fn module_id(name: &str) -> ModuleId {
    ModuleId::new(name).expect("valid module id")
}

fn widget(label: &'static str) -> impl Fn() -> Result<Arc<dyn Widget>, exthost_core::FactoryError> {
    move || Ok(Arc::new(Named(label)) as Arc<dyn Widget>)
}

fn two_module_registry() -> Registry {
    let with_metadata = StaticModule::new(module_id("exthost.a"))
        .export_with_metadata::<dyn Widget, _, _>(&NameRecord { name: "x" }, widget("a"));
    let without_metadata =
        StaticModule::new(module_id("exthost.b")).export::<dyn Widget, _>(widget("b"));
    Registry::from_modules(vec![with_metadata.into_handle(), without_metadata.into_handle()])
}

#[test]
fn plain_query_sees_every_export_and_metadata_query_only_matching_shapes() {
    let registry = two_module_registry();

    let all: Vec<_> = registry.get_exports::<dyn Widget>().collect();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].origin().name(), "exthost.a");
    assert_eq!(all[1].origin().name(), "exthost.b");

    let named = registry.get_exports_with_metadata::<dyn Widget, NameView>();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].metadata(), &NameView { name: "x".to_string() });
    assert_eq!(named[0].origin().name(), "exthost.a");
}

#[test]
fn export_count_matches_contributing_modules() {
    let modules: Vec<ModuleHandle> = (0..4)
        .map(|index| {
            StaticModule::new(module_id(&format!("exthost.m{index}")))
                .export::<dyn Widget, _>(widget("m"))
                .into_handle()
        })
        .collect();
    let registry = Registry::from_modules(modules);

    assert_eq!(registry.get_exports::<dyn Widget>().len(), 4);
    assert_eq!(registry.context().export_count(), 4);
    assert_eq!(
        registry.context().contracts(),
        vec![(ContractKey::of::<dyn Widget>(), 4)]
    );
}

#[test]
fn repeated_queries_return_the_same_exports_in_the_same_order() {
    let registry = two_module_registry();
    let origins = |registry: &Registry| -> Vec<String> {
        registry
            .get_exports::<dyn Widget>()
            .map(|export| export.origin().to_string())
            .collect()
    };

    let first = origins(&registry);
    for _ in 0..5 {
        assert_eq!(origins(&registry), first);
    }
}

#[test]
fn unknown_contract_yields_an_empty_sequence() {
    let registry = two_module_registry();
    assert_eq!(registry.get_exports::<dyn Gadget>().count(), 0);
    assert!(registry
        .get_exports_with_metadata::<dyn Gadget, NameView>()
        .is_empty());

    let empty = CompositionContext::empty();
    assert!(empty.lookup(ContractKey::of::<dyn Widget>()).is_empty());
    assert_eq!(empty.export_count(), 0);
}

#[test]
fn malformed_declaration_is_skipped_without_dropping_its_module() {
    let mismatched = ExportDeclaration::from_factory(
        ContractKey::of::<dyn Gadget>(),
        ExportFactory::new::<dyn Widget, _>(widget("wrong")),
    );
    let module = StaticModule::new(module_id("exthost.mixed"))
        .declare(mismatched)
        .export::<dyn Widget, _>(widget("right"));

    let context = CompositionContext::new(vec![module.into_handle()]);
    assert_eq!(context.modules().len(), 1);
    assert_eq!(context.export_count(), 1);
    assert!(context.lookup(ContractKey::of::<dyn Gadget>()).is_empty());
    assert!(matches!(
        context.issues(),
        [CompositionIssue::ExportSkipped { position: 0, .. }]
    ));
}

#[test]
fn duplicate_modules_contribute_once() {
    let module = StaticModule::new(module_id("exthost.a")).export::<dyn Widget, _>(widget("a"));
    let context = CompositionContext::new(vec![module.clone().into_handle(), module.into_handle()]);

    assert_eq!(context.modules().len(), 1);
    assert_eq!(context.export_count(), 1);
    assert_eq!(
        context.issues(),
        &[CompositionIssue::DuplicateModule(module_id("exthost.a"))]
    );
}
