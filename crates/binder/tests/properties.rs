use binder::allocator::{
    compact_numbers, next_sibling_number, sibling_number_after, sibling_number_before,
    sibling_number_directly_after,
};
use binder::commands::{delete, doctor};
use binder::filename::parse_filename;
use binder::model::FindingKind;
use binder::outline::build_outline;
use binder::store::lock::MemLocker;
use binder::store::mem_backend::MemBackend;
use binder::store::reserve::MemReserver;
use binder::{AllocError, DeleteMode, Project, Selector};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn test_allocator_fixtures() {
    let hundreds: Vec<u16> = (1..=9).map(|i| i * 100).collect();
    let mut tens = hundreds.clone();
    tens.extend((91..=99).map(|i| i * 10));
    let full: Vec<u16> = (1..=999).collect();

    assert_eq!(next_sibling_number(&[]), Ok(100));
    assert_eq!(next_sibling_number(&[100]), Ok(200));
    assert_eq!(next_sibling_number(&hundreds), Ok(910));
    assert_eq!(next_sibling_number(&tens), Ok(991));
    assert_eq!(
        next_sibling_number(&full),
        Err(AllocError::MaxSiblingsReached)
    );
    assert_eq!(sibling_number_before(&[100, 200, 300], 200), Ok(110));
    assert_eq!(sibling_number_after(&[100, 200], 200), Ok(300));
    assert_eq!(compact_numbers(9), Ok(hundreds));
    assert_eq!(compact_numbers(10), Err(AllocError::MaxSiblingsReached));
}

#[test]
fn test_duplicate_sid_keeps_first_path() {
    let records: Vec<_> = ["100_abcd1234_draft_a.md", "300_abcd1234_notes.md"]
        .iter()
        .map(|n| parse_filename(n).unwrap())
        .collect();
    let (outline, findings) = build_outline(&records);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::DuplicateSid);
    assert_eq!(outline.len(), 1);
    assert_eq!(outline.nodes()[0].mp.to_string(), "100");
}

fn occupied_set() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::btree_set(1u16..=999, 1..40).prop_map(|s| s.into_iter().collect())
}

fn sid(i: usize) -> String {
    format!("node{:04}", i)
}

proptest! {
    #[test]
    fn prop_next_sibling_is_free_and_last(occupied in occupied_set()) {
        if let Ok(n) = next_sibling_number(&occupied) {
            prop_assert!(!occupied.contains(&n));
            prop_assert!(occupied.iter().all(|o| *o < n));
        }
    }

    #[test]
    fn prop_before_lands_just_before_target(occupied in occupied_set(), pick in any::<prop::sample::Index>()) {
        let target = occupied[pick.index(occupied.len())];
        if let Ok(n) = sibling_number_before(&occupied, target) {
            let predecessor = occupied.iter().copied().filter(|o| *o < target).max().unwrap_or(0);
            prop_assert!(predecessor < n && n < target);
        }
    }

    #[test]
    fn prop_directly_after_keeps_order(occupied in occupied_set(), pick in any::<prop::sample::Index>()) {
        let target = occupied[pick.index(occupied.len())];
        if let Ok(n) = sibling_number_directly_after(&occupied, target) {
            let successor = occupied.iter().copied().filter(|o| *o > target).min().unwrap_or(1000);
            prop_assert!(target < n && n < successor);
        }
    }

    #[test]
    fn prop_promote_preserves_child_sids(children in 1usize..6, siblings in 0usize..4) {
        let mut files = vec![(format!("100_{}_draft_parent.md", sid(0)), String::new())];
        for i in 0..children {
            files.push((format!("100-{:03}_{}_draft_child.md", (i + 1) * 100, sid(i + 1)), String::new()));
        }
        for i in 0..siblings {
            files.push((format!("{:03}_{}_draft_other.md", (i + 2) * 100, sid(50 + i)), String::new()));
        }
        let project = Project::new(MemBackend::with_files(files), MemLocker::new(), MemReserver::new());

        delete::run(&project, &Selector::parse("100").unwrap(), DeleteMode::Promote, true).unwrap();

        let outline = project.load_outline().unwrap();
        prop_assert_eq!(outline.len(), children + siblings);
        let sids: BTreeSet<String> = outline.iter().map(|n| n.sid.to_string()).collect();
        for i in 1..=children {
            prop_assert!(sids.contains(&sid(i)));
        }
        // Promoted children sit at the top level, in their original order.
        let promoted: Vec<String> = outline
            .iter()
            .filter(|n| n.sid.as_str() != "node0000" && n.mp.depth() == 1 && n.sid.as_str() < "node0050")
            .map(|n| n.sid.to_string())
            .collect();
        prop_assert_eq!(promoted, (1..=children).map(sid).collect::<Vec<_>>());
    }

    #[test]
    fn prop_repair_is_idempotent(
        drift in any::<bool>(),
        drop_notes in any::<bool>(),
        drop_draft in any::<bool>(),
        break_header in any::<bool>(),
        orphan in any::<bool>(),
    ) {
        let mut files = Vec::new();
        let draft_header = if drift { "---\ntitle: Renamed\n---\n" } else { "---\ntitle: arrival\n---\n" };
        if !drop_draft {
            files.push(("100_abcd1234_draft_arrival.md".to_string(), draft_header.to_string()));
        }
        if !drop_notes || drop_draft {
            let notes = if break_header { "---\ntitle: [\n---\nbody\n" } else { "" };
            files.push(("100_abcd1234_notes.md".to_string(), notes.to_string()));
        }
        files.push(("200_efgh5678_draft_second.md".to_string(), String::new()));

        let reserved: Vec<&str> = if orphan { vec!["zzzz9999"] } else { vec!["abcd1234"] };
        let project = Project::new(
            MemBackend::with_files(files),
            MemLocker::new(),
            MemReserver::with_reserved(reserved).unwrap(),
        );

        let first = doctor::repair(&project, true).unwrap();
        prop_assert!(first.unrepaired.is_empty());
        let second = doctor::repair(&project, true).unwrap();
        prop_assert!(second.repairs.is_empty());
        prop_assert!(second.unrepaired.is_empty());
    }
}
