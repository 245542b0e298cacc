//! Property tests over the standard registry

use std::collections::BTreeSet;

use proptest::prelude::*;
use rolemask::constants::*;
use rolemask::{Engine, Mask, Permission, Subject};

fn arb_mask() -> impl Strategy<Value = Mask> {
    any::<u128>().prop_map(Mask::from_bits)
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    (arb_mask(), prop::collection::vec(arb_mask(), 0..4)).prop_map(|(own, roles)| {
        roles.into_iter().fold(Subject::new(own), |s, r| s.with_role(r))
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(standard_registry().get_all_permissions().into_iter().map(String::from).collect::<Vec<_>>()),
        "[A-Z_]{1,12}",
    ]
}

fn perm<'e>(e: &'e Engine, idx: usize) -> &'e Permission {
    let all: Vec<&Permission> = e.registry().iter().collect();
    all[idx % all.len()]
}

proptest! {
    #[test]
    fn add_then_has(s in arb_subject(), idx in 0usize..7) {
        let e = Engine::standard();
        let p = perm(&e, idx);
        let added = s.with_permissions(e.add_permission(&s, p));
        prop_assert!(e.has_permission(&added, p));
    }

    #[test]
    fn add_is_idempotent(s in arb_subject(), idx in 0usize..7) {
        let e = Engine::standard();
        let p = perm(&e, idx);
        let once = e.add_permission(&s, p);
        prop_assert_eq!(e.add_permission(&s.with_permissions(once), p), once);
    }

    #[test]
    fn administrator_passes_everything(s in arb_subject(), idx in 0usize..7, via_role in any::<bool>()) {
        let e = Engine::standard();
        let admin = e.get_permission(ADMINISTRATOR).unwrap().mask();
        let s = if via_role { s.with_role(admin) } else { s.with_permissions(s.permissions | admin) };
        prop_assert!(e.has_permission(&s, perm(&e, idx)));
    }

    #[test]
    fn removal_never_touches_other_bits(s in arb_subject(), idx in 0usize..7) {
        let e = Engine::standard();
        let p = perm(&e, idx);
        let after = e.remove_permission(&s, p);
        prop_assert_eq!(after.difference(p.mask()), s.permissions.difference(p.mask()));
        let refused = !e.blocking_dependants(&s, p).is_empty();
        if refused {
            prop_assert_eq!(after, s.permissions);
        } else {
            prop_assert!(!after.intersects(p.mask()));
        }
    }

    #[test]
    fn names_round_trip(names in prop::collection::vec(arb_name(), 0..16)) {
        let e = Engine::standard();
        let wire = e.get_permissions_from_names(&names).to_string();
        let listed: Vec<&str> = e.get_permission_list(&Mask::parse(&wire).unwrap());

        let expected: BTreeSet<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| e.get_permission(n).is_some())
            .collect();
        let got: BTreeSet<&str> = listed.iter().copied().collect();
        prop_assert_eq!(got.clone(), expected);
        prop_assert_eq!(listed.len(), got.len());
    }

    #[test]
    fn wire_round_trip(m in arb_mask()) {
        prop_assert_eq!(m.to_string().parse::<Mask>().unwrap(), m);
    }

    #[test]
    fn match_any_is_weaker_than_match_all(s in arb_subject(), a in 0usize..7, b in 0usize..7) {
        let e = Engine::standard();
        let ps = [perm(&e, a), perm(&e, b)];
        if e.has_permissions(&s, &ps, false) {
            prop_assert!(e.has_permissions(&s, &ps, true));
        }
    }
}
