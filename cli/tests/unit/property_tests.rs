//! Property tests for command building.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use hab_common::{Bind, ProvisioningRequest, ServiceDeclaration, Topology};
use hab_provisioner::domain::command::{
    SERVICE_LOAD_FLAG_ORDER, SUPERVISOR_FLAG_ORDER, service_load_options, supervisor_options,
};
use proptest::prelude::*;

fn value() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z0-9][a-z0-9.:-]{0,12}")
}

prop_compose! {
    fn supervisor_request()(
        permanent_peer in any::<bool>(),
        listen_gossip in value(),
        listen_http in value(),
        peer in value(),
        ring_key in value(),
        url in value(),
        channel in value(),
        events in value(),
        override_name in value(),
        organization in value(),
    ) -> ProvisioningRequest {
        ProvisioningRequest {
            permanent_peer,
            listen_gossip,
            listen_http,
            peer,
            ring_key,
            url,
            channel,
            events,
            override_name,
            organization,
            ..ProvisioningRequest::default()
        }
    }
}

/// Flags in the order they appear in `rendered`.
fn flags_in(rendered: &str) -> Vec<&str> {
    rendered
        .split(' ')
        .filter(|token| token.starts_with('-'))
        .collect()
}

fn is_ordered_by(flags: &[&str], order: &[&str]) -> bool {
    let ranks: Vec<usize> = flags
        .iter()
        .map(|f| order.iter().position(|o| o == f).expect("unknown flag"))
        .collect();
    ranks.windows(2).all(|w| w[0] < w[1])
}

proptest! {
    #[test]
    fn prop_supervisor_flags_follow_fixed_order(req in supervisor_request()) {
        let rendered = supervisor_options(&req);
        let order: Vec<&str> = SUPERVISOR_FLAG_ORDER.iter().map(|f| f.flag()).collect();
        let flags = flags_in(&rendered);
        prop_assert!(is_ordered_by(&flags, &order), "{rendered}");
    }

    #[test]
    fn prop_supervisor_flags_present_iff_value_set(req in supervisor_request()) {
        let rendered = supervisor_options(&req);
        let has_peer = req.peer.as_deref().is_some_and(|p| !p.is_empty());
        prop_assert_eq!(flags_in(&rendered).contains(&"--peer"), has_peer);
        prop_assert_eq!(flags_in(&rendered).contains(&"-I"), req.permanent_peer);
        prop_assert!(!rendered.starts_with(' ') && !rendered.ends_with(' '));
    }

    #[test]
    fn prop_binds_follow_service_flags_in_declaration_order(
        names in proptest::collection::vec("[a-z]{1,8}", 0..5),
        leader in any::<bool>(),
    ) {
        let mut svc = ServiceDeclaration::new("core/app".parse().unwrap());
        if leader {
            svc.topology = Some(Topology::Leader);
        }
        svc.group = Some("prod".to_string());
        svc.binds = names.iter().map(|n| Bind::new(n, n, "default")).collect();

        let rendered = service_load_options(&svc);
        let mut order: Vec<&str> = SERVICE_LOAD_FLAG_ORDER.iter().map(|f| f.flag()).collect();
        order.push("--bind");
        let flags: Vec<&str> = flags_in(&rendered);
        let fixed: Vec<&str> = flags.iter().copied().filter(|f| *f != "--bind").collect();
        prop_assert!(is_ordered_by(&fixed, &order), "{rendered}");

        let bind_values: Vec<String> = rendered
            .split("--bind ")
            .skip(1)
            .map(|s| s.trim().to_string())
            .collect();
        let expected: Vec<String> = names.iter().map(|n| format!("{n}:{n}.default")).collect();
        prop_assert_eq!(bind_values, expected);
    }
}
