use super::*;
use serde_json::json;

fn app(label: &str) -> FiberSpec {
    FiberSpec::function("App").with_child(
        FiberSpec::host("div")
            .with_key("box")
            .with_rect(0.0, 0.0, 100.0, 100.0)
            .with_props(json!({ "label": label })),
    )
}

#[test]
fn test_first_render_places_every_node() {
    let host = MemoryHost::new();
    let root = host.create_root();
    let deleted = host.render(root, Some(app("a")));
    assert!(deleted.is_empty());

    let current = host.current(root).unwrap();
    assert_eq!(host.tag(current), WorkTag::HOST_ROOT);
    let app_node = host.child(current).unwrap();
    assert_eq!(host.tag(app_node), WorkTag::FUNCTION_COMPONENT);
    assert!(host.flags(app_node).contains(FiberFlags::PLACEMENT));
    assert!(host.alternate(app_node).is_none());
}

#[test]
fn test_rerender_links_alternates() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let first_div = host.find_node(root, "box").unwrap();
    let element = host.find_element(root, "box").unwrap();

    host.render(root, Some(app("b")));
    let second_div = host.find_node(root, "box").unwrap();
    assert_ne!(first_div, second_div);
    assert_eq!(host.alternate(second_div), Some(first_div));
    assert!(host.flags(second_div).did_perform_work());
    assert_eq!(host.find_element(root, "box"), Some(element));
}

#[test]
fn test_identical_render_reuses_children() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let app_node = host.child(host.current(root).unwrap()).unwrap();

    host.render(root, Some(app("a")));
    let new_root = host.current(root).unwrap();
    assert_eq!(host.child(new_root), Some(app_node));
}

#[test]
fn test_removed_child_is_reported() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let div = host.find_node(root, "box").unwrap();
    let element = host.find_element(root, "box").unwrap();

    let deleted = host.render(root, Some(FiberSpec::function("App")));
    assert_eq!(deleted, vec![div]);
    assert!(!host.is_attached(element));
}

#[test]
fn test_unmount_root_reports_whole_tree() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let deleted = host.render(root, None);
    assert_eq!(deleted.len(), 2);
    assert!(host.current(root).is_none());
}

#[test]
fn test_suspense_structure() {
    let host = MemoryHost::new();
    let root = host.create_root();
    let tree = |show| {
        FiberSpec::suspense(
            vec![FiberSpec::host("main").with_key("primary").with_rect(0.0, 0.0, 50.0, 50.0)],
            vec![FiberSpec::host("p").with_key("spinner").with_rect(0.0, 0.0, 50.0, 50.0)],
            show,
        )
    };

    host.render(root, Some(tree(false)));
    let boundary = host.child(host.current(root).unwrap()).unwrap();
    assert!(!fibertrace_protocols::tree::is_showing_fallback(&host, boundary));
    assert!(fibertrace_protocols::tree::fallback_branch(&host, boundary).is_none());

    host.render(root, Some(tree(true)));
    let boundary = host.child(host.current(root).unwrap()).unwrap();
    assert!(fibertrace_protocols::tree::is_showing_fallback(&host, boundary));
    let primary = fibertrace_protocols::tree::primary_branch(&host, boundary).unwrap();
    assert_eq!(host.tag(primary), WorkTag::OFFSCREEN_COMPONENT);
    let fallback = fibertrace_protocols::tree::fallback_branch(&host, boundary).unwrap();
    assert_eq!(host.tag(fallback), WorkTag::FRAGMENT);

    let spinner = host.find_element(root, "spinner").unwrap();
    assert_eq!(host.element_at_point(10.0, 10.0), Some(spinner));

    let deleted = host.render(root, Some(tree(false)));
    assert!(deleted.contains(&fallback));
    let main = host.find_element(root, "primary").unwrap();
    assert_eq!(host.element_at_point(10.0, 10.0), Some(main));
}

#[test]
fn test_element_at_point_prefers_deepest_and_last() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(
        root,
        Some(
            FiberSpec::host("div")
                .with_key("outer")
                .with_rect(0.0, 0.0, 100.0, 100.0)
                .with_children(vec![
                    FiberSpec::host("span").with_key("left").with_rect(0.0, 0.0, 60.0, 20.0),
                    FiberSpec::host("span").with_key("right").with_rect(50.0, 0.0, 50.0, 20.0),
                ]),
        ),
    );
    let outer = host.find_element(root, "outer").unwrap();
    let left = host.find_element(root, "left").unwrap();
    let right = host.find_element(root, "right").unwrap();

    assert_eq!(host.element_at_point(10.0, 10.0), Some(left));
    assert_eq!(host.element_at_point(55.0, 10.0), Some(right));
    assert_eq!(host.element_at_point(10.0, 50.0), Some(outer));
    assert_eq!(host.parent_element(left), Some(outer));
    assert_eq!(host.element_at_point(500.0, 500.0), None);
}

#[test]
fn test_overlay_is_topmost() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let overlay = host.add_overlay(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(host.element_at_point(5.0, 5.0), Some(overlay));
    assert!(host.is_overlay(overlay));
    assert!(!host.is_overlay(host.find_element(root, "box").unwrap()));
}

#[test]
fn test_corrupt_hooks_fail_to_read() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(
        root,
        Some(FiberSpec::function("Broken").with_hooks(vec![json!(1)]).with_corrupt_hooks()),
    );
    let node = host.child(host.current(root).unwrap()).unwrap();
    assert!(matches!(
        host.first_hook(node),
        Err(ExtractionError::CorruptHookList { .. })
    ));
}

#[test]
fn test_hook_chain() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(
        root,
        Some(FiberSpec::function("Counter").with_hooks(vec![json!(1), json!("two")])),
    );
    let node = host.child(host.current(root).unwrap()).unwrap();
    let first = host.first_hook(node).unwrap().unwrap();
    let entry = host.hook(first).unwrap();
    assert_eq!(entry.memoized_value, json!(1));
    let second = host.hook(entry.next.unwrap()).unwrap();
    assert_eq!(second.memoized_value, json!("two"));
    assert!(second.next.is_none());
}

#[test]
fn test_listener_bookkeeping() {
    let host = MemoryHost::new();
    let id = host.listen(InputKind::Click);
    assert!(host.is_listening(InputKind::Click));
    host.unlisten(id);
    assert_eq!(host.active_listeners(), 0);
}

#[test]
fn test_unreadable_node() {
    let host = MemoryHost::new();
    let root = host.create_root();
    host.render(root, Some(app("a")));
    let node = host.child(host.current(root).unwrap()).unwrap();
    host.make_unreadable(node);
    assert!(host.memoized_props(node).is_err());
    assert_eq!(host.tag(node), WorkTag::FUNCTION_COMPONENT);
}
