//! End-to-end checks of generation feeding a live excavation.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::cell::RefCell;
use std::rc::Rc;

use dig_events::{EventBus, EventKind, EventPayload};
use dig_types::{ArtifactId, Visibility};
use dig_world::{Excavation, SiteProfile, generate};

fn two_file_profile() -> SiteProfile {
    SiteProfile {
        max_depth: 1,
        branch_factor: 0.0,
        branch_spread: 0.0,
        files_per_dir: 2.0,
        file_spread: 0.0,
        debris_ratio: 0.0,
        artifact_density: 1.0,
        ..SiteProfile::default()
    }
}

#[test]
fn two_scans_surface_each_artifact() {
    let tree = generate(&two_file_profile(), 7).expect("generation succeeds");
    let bus = Rc::new(EventBus::new());
    let found = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&found);
    bus.subscribe(EventKind::ArtifactFound, move |event, _| {
        if let EventPayload::ArtifactFound { artifact, .. } = event.payload() {
            sink.borrow_mut().push(artifact.clone());
        }
        Ok(())
    });

    let mut excavation = Excavation::new(tree, Rc::clone(&bus));
    let names: Vec<String> = excavation
        .list_children(true)
        .iter()
        .map(|n| n.name().to_owned())
        .collect();
    assert_eq!(names.len(), 2);

    for name in &names {
        let first = excavation.reveal(name).unwrap();
        assert_eq!(first.visibility, Visibility::Detected);
        bus.flush();
        assert!(first.artifact.is_none());

        let second = excavation.reveal(name).unwrap();
        assert_eq!(second.visibility, Visibility::Revealed);
        assert!(second.artifact.is_some());
        bus.flush();
    }

    assert_eq!(
        *found.borrow(),
        vec![
            ArtifactId::new("arc_corporate_0000"),
            ArtifactId::new("arc_corporate_0001"),
        ]
    );
}

#[test]
fn generated_site_is_navigable() {
    let tree = generate(&SiteProfile::research(), 21).unwrap();
    let bus = Rc::new(EventBus::new());
    let mut excavation = Excavation::new(tree, bus);

    let dirs: Vec<String> = excavation
        .list_children(false)
        .iter()
        .filter(|n| n.is_directory())
        .map(|n| n.name().to_owned())
        .collect();
    for dir in dirs {
        excavation.change_directory(&dir).unwrap();
        assert_eq!(excavation.current_path(), format!("/{dir}"));
        excavation.change_directory("..").unwrap();
    }
    assert_eq!(excavation.current_path(), "/");
}
