use fibertrace_config::{Config, EngineConfig, HookConfig};
use fibertrace_protocols::{CommitEventKind, DevtoolsHook};
use fibertrace_testkit::{FiberSpec, MemoryHost, RecordingObserver};

use super::*;
use crate::hook::{GlobalHook, HookOccupant, HookSlot};

struct Fixture {
    engine: Arc<Engine>,
    hook: Arc<GlobalHook>,
    host: Arc<MemoryHost>,
    renderer: RendererId,
    root: RootRef,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(Config::default(), MemoryHost::new())
    }

    fn with_config(config: Config, host: MemoryHost) -> Self {
        let engine = Arc::new(Engine::new(&config));
        let hook = engine
            .attach(&HookInstaller::new(Arc::new(HookSlot::new())))
            .unwrap()
            .hook()
            .unwrap();
        let host = Arc::new(host);
        let renderer = host.inject_into(hook.as_ref());
        let root = host.create_root();
        Self {
            engine,
            hook,
            host,
            renderer,
            root,
        }
    }

    fn commit(&self, spec: Option<FiberSpec>) {
        self.host
            .commit(self.hook.as_ref(), self.renderer, self.root, spec);
    }

    fn named(&self, name: &str) -> ComponentRecord {
        self.engine
            .get_all_components()
            .into_iter()
            .find(|r| r.display_name == name)
            .unwrap()
    }

    fn names(&self) -> Vec<String> {
        self.engine
            .get_all_components()
            .into_iter()
            .map(|r| r.display_name)
            .collect()
    }
}

fn app() -> FiberSpec {
    FiberSpec::function("App").with_children(vec![
        FiberSpec::function("Header").with_child(FiberSpec::host("h1")),
        FiberSpec::function("Panel")
            .with_key("panel")
            .with_children(vec![FiberSpec::host("button"), FiberSpec::host("i")]),
    ])
}

#[test]
fn test_development_renderer_is_attached() {
    let f = Fixture::new();
    assert!(f.engine.renderer_status(f.renderer).unwrap().is_attached());
    assert_eq!(f.engine.attached_renderers(), vec![f.renderer]);

    f.commit(Some(app()));
    assert_eq!(f.engine.commit_count(), 1);
    assert_eq!(f.engine.tracked_roots(), 1);
    assert_eq!(f.engine.get_all_components().len(), 6);
}

#[test]
fn test_production_renderer_is_refused() {
    let f = Fixture::with_config(
        Config::default(),
        MemoryHost::with_info(RendererInfo::production("react-dom", "18.3.1")),
    );
    assert!(matches!(
        f.engine.renderer_status(f.renderer),
        Some(RendererStatus::Refused(_))
    ));

    f.commit(Some(app()));
    assert_eq!(f.engine.commit_count(), 0);
    assert!(f.engine.get_all_components().is_empty());
    assert!(f.engine.attached_renderers().is_empty());
}

#[test]
fn test_production_override_attaches() {
    let config = Config {
        hook: HookConfig {
            allow_production: true,
            ..HookConfig::default()
        },
        ..Config::default()
    };
    let f = Fixture::with_config(
        config,
        MemoryHost::with_info(RendererInfo::production("react-dom", "18.3.1")),
    );
    f.commit(Some(app()));
    assert_eq!(f.engine.get_all_components().len(), 6);
}

#[test]
fn test_merge_replays_existing_renderer() {
    let hook = Arc::new(GlobalHook::new());
    let host = Arc::new(MemoryHost::new());
    let renderer = host.inject_into(hook.as_ref());
    let root = host.create_root();
    host.commit(hook.as_ref(), renderer, root, Some(app()));

    let engine = Arc::new(Engine::new(&Config::default()));
    let slot = Arc::new(HookSlot::with_occupant(HookOccupant::Compatible(hook.clone())));
    let outcome = engine.attach(&HookInstaller::new(slot)).unwrap();
    assert!(matches!(outcome, InstallOutcome::Merged(_)));
    assert!(engine.renderer_status(renderer).unwrap().is_attached());

    // The next commit reuses every node, but the engine has never seen them.
    host.commit(hook.as_ref(), renderer, root, Some(app()));
    assert_eq!(engine.get_all_components().len(), 6);
}

#[test]
fn test_install_conflict_disables_engine() {
    let engine = Arc::new(Engine::new(&Config::default()));
    let slot = Arc::new(HookSlot::with_occupant(HookOccupant::Incompatible {
        description: "legacy".to_string(),
    }));
    let err = engine.attach(&HookInstaller::new(slot)).unwrap_err();
    assert!(matches!(err, HookError::InstallConflict(_)));
    assert!(engine.is_disabled());
}

#[test]
fn test_disabled_engine_ignores_commits() {
    let f = Fixture::new();
    f.engine.disable();
    f.commit(Some(app()));
    assert_eq!(f.engine.commit_count(), 0);
    assert!(f.engine.get_all_components().is_empty());
}

#[test]
fn test_unmount_notifications_are_flushed_once() {
    let f = Fixture::new();
    let observer = Arc::new(RecordingObserver::new());
    f.engine.add_observer(observer.clone());
    f.commit(Some(app()));
    observer.clear();

    f.commit(Some(FiberSpec::function("App").with_child(
        FiberSpec::function("Header").with_child(FiberSpec::host("h1")),
    )));
    let unmounted = observer.names(CommitEventKind::Unmount);
    assert_eq!(unmounted.len(), 3);
    assert_eq!(unmounted.last().map(String::as_str), Some("Panel"));
    assert_eq!(f.names(), vec!["App", "Header", "h1"]);
}

#[test]
fn test_removal_without_notifications_matches() {
    let f = Fixture::new();
    f.host.set_notify_unmounts(false);
    f.commit(Some(app()));
    f.commit(Some(FiberSpec::function("App")));
    assert_eq!(f.names(), vec!["App"]);
    assert!(f.named("App").children.is_empty());
}

#[test]
fn test_root_unmount_drops_session() {
    let f = Fixture::new();
    f.commit(Some(app()));
    f.commit(None);
    assert_eq!(f.engine.tracked_roots(), 0);
    assert!(f.engine.get_all_components().is_empty());
    assert_eq!(f.engine.element_count(), 0);
    assert_eq!(f.engine.identity_count(), 0);

    f.commit(Some(app()));
    assert_eq!(f.engine.tracked_roots(), 1);
    assert_eq!(f.engine.get_all_components().len(), 6);
}

#[test]
fn test_roots_are_tracked_independently() {
    let f = Fixture::new();
    let other = f.host.create_root();
    f.commit(Some(app()));
    f.host.commit(
        f.hook.as_ref(),
        f.renderer,
        other,
        Some(FiberSpec::function("Sidebar")),
    );
    assert_eq!(f.engine.tracked_roots(), 2);
    let tree: Vec<String> = f
        .engine
        .get_component_tree()
        .into_iter()
        .map(|r| r.display_name)
        .collect();
    assert_eq!(tree, vec!["App", "Sidebar"]);

    f.host.commit(f.hook.as_ref(), f.renderer, other, None);
    assert_eq!(f.engine.tracked_roots(), 1);
    assert_eq!(f.engine.get_all_components().len(), 6);
}

#[test]
fn test_observers_receive_events_and_summary() {
    let f = Fixture::new();
    let observer = Arc::new(RecordingObserver::new());
    f.engine.add_observer(observer.clone());

    f.commit(Some(app()));
    let summaries = observer.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].renderer, Some(f.renderer));
    assert_eq!(summaries[0].root, Some(f.root));
    assert_eq!(summaries[0].mounted, 6);
    assert_eq!(
        observer.names(CommitEventKind::Mount),
        vec!["App", "Header", "h1", "Panel", "button", "i"]
    );
}

/// Observer that queries the engine from inside its callback.
struct Reentrant {
    engine: Arc<Engine>,
    seen: parking_lot::Mutex<Vec<usize>>,
}

impl CommitObserver for Reentrant {
    fn on_commit_complete(&self, _summary: &CommitSummary) {
        self.seen.lock().push(self.engine.get_all_components().len());
    }
}

#[test]
fn test_observers_run_outside_engine_locks() {
    let f = Fixture::new();
    let observer = Arc::new(Reentrant {
        engine: f.engine.clone(),
        seen: parking_lot::Mutex::new(Vec::new()),
    });
    f.engine.add_observer(observer.clone());
    f.commit(Some(app()));
    assert_eq!(*observer.seen.lock(), vec![6]);
}

#[test]
fn test_commit_from_unknown_renderer_is_ignored() {
    let f = Fixture::new();
    f.host.render(f.root, Some(app()));
    f.hook.on_commit_fiber_root(RendererId(99), f.root, None);
    assert_eq!(f.engine.commit_count(), 0);
}

#[test]
fn test_component_stack() {
    let f = Fixture::new();
    f.commit(Some(app()));
    let h1 = f.named("h1");
    assert_eq!(f.engine.get_component_stack(h1.id), vec!["App", "Header", "h1"]);
    assert!(f.engine.get_component_stack(Identity(9999)).is_empty());

    let logical: Vec<String> = f
        .engine
        .get_logical_components()
        .into_iter()
        .map(|r| r.display_name)
        .collect();
    assert_eq!(logical, vec!["App", "Header", "Panel"]);
}

fn card(child: FiberSpec) -> FiberSpec {
    FiberSpec::function("Card").with_child(child)
}

#[test]
fn test_detached_elements_are_pruned() {
    let config = Config {
        engine: EngineConfig {
            prune_interval_commits: 1,
            ..EngineConfig::default()
        },
        ..Config::default()
    };
    let f = Fixture::with_config(config, MemoryHost::new());
    f.engine.set_surface(f.host.clone());

    f.commit(Some(card(FiberSpec::host("div").with_key("old"))));
    let old = f.host.find_element(f.root, "old").unwrap();
    assert_eq!(f.engine.element_owner(old), Some(f.named("Card").id));

    f.commit(Some(card(FiberSpec::host("span"))));
    assert_eq!(f.engine.element_owner(old), None);
    assert_eq!(f.engine.element_count(), 1);
}

#[test]
fn test_stale_claim_survives_without_surface() {
    let f = Fixture::new();
    f.commit(Some(card(FiberSpec::host("div").with_key("old"))));
    let old = f.host.find_element(f.root, "old").unwrap();

    f.commit(Some(card(FiberSpec::host("span"))));
    assert_eq!(f.engine.element_owner(old), Some(f.named("Card").id));
}
