#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use partmesh::operations::cleanup::CollapseScope;
use partmesh::topology::{Color, Element, ElementKind, GroupData, MeshStore, Primitive, Vertex};
use partmesh::{collapse_degenerate_geometry, CollapseDegenerate, CollapseOptions, Document, TextSync};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Records the element counts the text view was refreshed with.
#[derive(Clone, Default)]
struct TextView(Rc<RefCell<Vec<usize>>>);

impl TextSync for TextView {
    fn synchronize(&mut self, store: &MeshStore) {
        self.0.borrow_mut().push(store.element_count());
    }
}

#[test]
fn cleans_a_mixed_part() {
    init_tracing();
    let view = TextView::default();
    let mut doc = Document::new();
    doc.set_text_sync(Box::new(view.clone()));

    let store = doc.store_mut();
    let group = store.add_group(GroupData::new("top face"));
    let mut vertex = |x, y, z| store.add_vertex(Vertex::new(x, y, z).unwrap());
    let v1 = vertex(0.0, 0.0, 0.0);
    let v2 = vertex(10.0, 0.0, 0.0);
    let v3 = vertex(10.0, 0.0, 10.0);
    let v4 = vertex(0.0, 0.0, 10.0);
    let v1_twin = vertex(-0.0, 0.0, 0.0);
    let color = Color::indexed(4);

    let edge = store.add_element(Element::line([v1, v2])).unwrap();
    let dot = store.add_element(Element::line([v1, v1_twin])).unwrap();
    let face = store
        .add_element(Element::quad([v1, v2, v3, v4]).with_color(color))
        .unwrap();
    let pinched = store
        .add_element(
            Element::quad([v1, v2, v3, v1_twin])
                .with_color(color)
                .with_parent(group),
        )
        .unwrap();
    let sliver = store.add_element(Element::triangle([v1, v2, v1_twin])).unwrap();
    let outline = store
        .add_element(Element::cond_line([v1, v2], [v3, v4]))
        .unwrap();
    let bad_outline = store
        .add_element(Element::cond_line([v1, v2], [v3, v1_twin]))
        .unwrap();

    doc.select(face).unwrap();
    doc.select(pinched).unwrap();

    let report = CollapseDegenerate::new(CollapseOptions::default().split_quads(true))
        .execute(&mut doc)
        .unwrap();

    assert_eq!(report.deleted(ElementKind::Line), 1);
    assert_eq!(report.deleted(ElementKind::Triangle), 1);
    assert_eq!(report.deleted(ElementKind::Quad), 1);
    assert_eq!(report.deleted(ElementKind::CondLine), 1);
    assert_eq!(report.inserted.len(), 1);
    let replacement = report.inserted[0];

    let store = doc.store();
    for gone in [dot, pinched, sliver, bad_outline] {
        assert!(!store.contains_element(gone));
    }
    assert_eq!(
        store.document_order(),
        &[edge, face, replacement, outline]
    );
    let triangle = store.element(replacement).unwrap();
    assert_eq!(triangle.primitive, Primitive::Triangle([v1, v2, v3]));
    assert_eq!(triangle.color, color);
    assert_eq!(triangle.parent, Some(group));

    assert!(doc.selection().contains(face));
    assert!(!doc.selection().contains(pinched));
    assert!(doc.selection().contains(replacement));
    assert_eq!(doc.selection().len(), 2);
    assert_eq!(*view.0.borrow(), vec![4]);
}

#[test]
fn selection_scope_leaves_the_rest_alone() {
    init_tracing();
    let mut doc = Document::new();
    let store = doc.store_mut();
    let a = store.add_vertex(Vertex::new(0.0, 0.0, 0.0).unwrap());
    let b = store.add_vertex(Vertex::new(0.0, 1.0, 0.0).unwrap());
    let inside = store.add_element(Element::triangle([a, b, b])).unwrap();
    let outside = store.add_element(Element::triangle([a, a, b])).unwrap();
    doc.select(inside).unwrap();

    let options = CollapseOptions::default()
        .scope(CollapseScope::Selection)
        .sync_with_editor(false);
    CollapseDegenerate::new(options).execute(&mut doc).unwrap();
    assert!(!doc.store().contains_element(inside));
    assert!(doc.store().contains_element(outside));

    collapse_degenerate_geometry(&mut doc, false, false).unwrap();
    assert!(doc.store().is_empty());
    assert_eq!(doc.store().vertex_count(), 0);
}
