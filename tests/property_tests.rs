use sfcgraph::{
    GraphStore, InMemorySfcClient, InspectionPort, NetworkElement, RedirectionApi,
    RedirectionError, RemoteGraphStore, SqliteGraphStore,
};

fn local_api() -> RedirectionApi<SqliteGraphStore> {
    RedirectionApi::new(SqliteGraphStore::open_in_memory().expect("store"))
}

fn remote_api() -> RedirectionApi<RemoteGraphStore<InMemorySfcClient>> {
    RedirectionApi::new(RemoteGraphStore::new(InMemorySfcClient::new()))
}

fn sample_port(ingress: &str, egress: &str) -> InspectionPort {
    InspectionPort::new(
        NetworkElement::with_addresses(ingress, &["fa:16:3e:00:00:01"], &["10.0.0.1"]),
        NetworkElement::with_addresses(egress, &["fa:16:3e:00:00:02"], &["10.0.0.2"]),
    )
}

fn element(id: &str) -> NetworkElement {
    NetworkElement::with_id(id)
}

fn sample_group<S: GraphStore>(api: &RedirectionApi<S>, ingress: &str, egress: &str) -> String {
    api.register_inspection_port(Some(&sample_port(ingress, egress)))
        .expect("register")
        .parent_id
        .expect("parent")
}

fn sample_chain<S: GraphStore>(api: &RedirectionApi<S>, name: &str) -> String {
    let group = sample_group(api, &format!("{name}-in"), &format!("{name}-out"));
    api.register_network_element(&[element(&group)])
        .expect("chain")
        .element_id
}

fn remove_port_twice<S: GraphStore>(api: &RedirectionApi<S>) {
    let port = api
        .register_inspection_port(Some(&sample_port("in", "out")))
        .expect("register");
    api.remove_inspection_port(Some(&port)).expect("first remove");
    api.remove_inspection_port(Some(&port)).expect("second remove");
    assert!(api.get_inspection_port(Some(&port)).expect("get").is_none());
}

fn register_without_parent_creates_single_member_group<S: GraphStore>(api: &RedirectionApi<S>) {
    let port = api
        .register_inspection_port(Some(&sample_port("in", "out")))
        .expect("register");
    let port_id = port.element_id.clone().expect("id");
    let group_id = port.parent_id.clone().expect("parent");

    let group = api.lookup().find_group(&group_id).expect("find").expect("group");
    assert_eq!(group.port_pairs, vec![port_id.clone()]);
    assert!(group.chain_id.is_none());

    let stored = api.get_inspection_port(Some(&port)).expect("get").expect("port");
    assert_eq!(stored.parent_id.as_deref(), Some(group_id.as_str()));
    assert_eq!(port.ingress.as_ref().and_then(NetworkElement::id), Some("in"));
}

fn removing_last_port_removes_group<S: GraphStore>(api: &RedirectionApi<S>) {
    let port = api
        .register_inspection_port(Some(&sample_port("in", "out")))
        .expect("register");
    let port_id = port.element_id.clone().expect("id");
    let group_id = port.parent_id.clone().expect("parent");

    api.remove_inspection_port(Some(&port)).expect("remove");

    let lookup = api.lookup();
    assert!(lookup.find_group(&group_id).expect("find").is_none());
    assert!(lookup.find_group_containing_pair(&port_id).expect("find").is_none());
    assert!(api.store().list_groups().expect("groups").is_empty());
}

fn duplicate_hook_is_conflict<S: GraphStore>(api: &RedirectionApi<S>) {
    let chain = sample_chain(api, "c");
    let inspected = element("vm-1");
    api.install_inspection_hook(Some(&inspected), Some(&element(&chain)), None, None, None, None)
        .expect("first install");
    let err = api
        .install_inspection_hook(Some(&inspected), Some(&element(&chain)), None, None, None, None)
        .unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");
    assert_eq!(
        err.to_string(),
        format!("Found existing inspection hook (Inspected vm-1 ; Inspection Port {chain})")
    );
    assert_eq!(api.store().list_hooks().expect("hooks").len(), 1);
}

fn chain_order_round_trips<S: GraphStore>(api: &RedirectionApi<S>) {
    let g1 = sample_group(api, "a-in", "a-out");
    let g2 = sample_group(api, "b-in", "b-out");
    let g3 = sample_group(api, "c-in", "c-out");

    let chain = api
        .register_network_element(&[element(&g1), element(&g2), element(&g3)])
        .expect("register");
    let chain_ref = element(&chain.element_id);
    let ids: Vec<String> = api
        .get_network_elements(Some(&chain_ref))
        .expect("read")
        .into_iter()
        .map(|g| g.element_id)
        .collect();
    assert_eq!(ids, vec![g1.clone(), g2.clone(), g3.clone()]);

    api.update_network_element(Some(&chain_ref), &[element(&g3), element(&g2), element(&g1)])
        .expect("update");
    let ids: Vec<String> = api
        .get_network_elements(Some(&chain_ref))
        .expect("read")
        .into_iter()
        .map(|g| g.element_id)
        .collect();
    assert_eq!(ids, vec![g3, g2, g1]);
}

fn bound_group_is_exclusive<S: GraphStore>(api: &RedirectionApi<S>) {
    let group = sample_group(api, "in", "out");
    let chain_a = api
        .register_network_element(&[element(&group)])
        .expect("chain a")
        .element_id;
    let other = sample_group(api, "x-in", "x-out");
    let chain_b = api
        .register_network_element(&[element(&other)])
        .expect("chain b")
        .element_id;

    let err = api.register_network_element(&[element(&group)]).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        err.to_string(),
        format!("Port Pair Group Id {group} is already chained to SFC Id : {chain_a}")
    );

    let err = api
        .update_network_element(Some(&element(&chain_b)), &[element(&other), element(&group)])
        .unwrap_err();
    assert!(err.is_conflict());

    let lookup = api.lookup();
    let bound = lookup
        .find_chain_containing_group(&group)
        .expect("find")
        .expect("still bound");
    assert_eq!(bound.element_id, chain_a);
    let b = lookup.find_chain(&chain_b).expect("find").expect("chain b");
    assert_eq!(b.port_pair_groups, vec![other]);
}

fn removed_hook_is_gone<S: GraphStore>(api: &RedirectionApi<S>) {
    let chain = sample_chain(api, "c");
    let hook_id = api
        .install_inspection_hook(Some(&element("vm-x")), Some(&element(&chain)), None, None, None, None)
        .expect("install");
    let hook = api
        .get_inspection_hook(Some(&hook_id))
        .expect("get")
        .expect("hook");
    assert_eq!(hook.inspection_port(), Some(chain.as_str()));
    assert_eq!(hook.inspected_id(), Some("vm-x"));

    api.remove_inspection_hook(Some(&hook_id)).expect("remove");

    assert!(api.get_inspection_hook(Some(&hook_id)).expect("get").is_none());
    assert!(
        api.store()
            .hooks_by_inspected_and_chain("vm-x", &chain)
            .expect("hooks")
            .is_empty()
    );
    let chain = api.lookup().find_chain(&chain).expect("find").expect("chain");
    assert!(chain.inspection_hooks.is_empty());
}

fn deleting_chain_keeps_groups<S: GraphStore>(api: &RedirectionApi<S>) {
    let g1 = sample_group(api, "a-in", "a-out");
    let g2 = sample_group(api, "b-in", "b-out");
    let chain = api
        .register_network_element(&[element(&g1), element(&g2)])
        .expect("register")
        .element_id;

    api.delete_network_element(Some(&element(&chain))).expect("delete");

    let lookup = api.lookup();
    for group_id in [&g1, &g2] {
        let group = lookup.find_group(group_id).expect("find").expect("group survives");
        assert!(group.chain_id.is_none());
        assert!(lookup.find_chain_containing_group(group_id).expect("find").is_none());
    }
    let err = api.get_network_elements(Some(&element(&chain))).unwrap_err();
    assert!(matches!(err, RedirectionError::NotFound { .. }));
    assert_eq!(
        err.to_string(),
        format!("Cannot find Service Function Chain by id: {chain}!")
    );
}

fn repeated_registration_reuses_port_and_group<S: GraphStore>(api: &RedirectionApi<S>) {
    let first = api
        .register_inspection_port(Some(&sample_port("in", "out")))
        .expect("first");
    let second = api
        .register_inspection_port(Some(&sample_port("in", "out")))
        .expect("second");
    assert_eq!(first.element_id, second.element_id);
    assert_eq!(first.parent_id, second.parent_id);
    assert_eq!(api.store().list_ports().expect("ports").len(), 1);
    assert_eq!(api.store().list_groups().expect("groups").len(), 1);
}

#[test]
fn test_remove_port_twice_local() {
    remove_port_twice(&local_api());
}

#[test]
fn test_remove_port_twice_remote() {
    remove_port_twice(&remote_api());
}

#[test]
fn test_register_without_parent_local() {
    register_without_parent_creates_single_member_group(&local_api());
}

#[test]
fn test_register_without_parent_remote() {
    register_without_parent_creates_single_member_group(&remote_api());
}

#[test]
fn test_last_port_removal_deletes_group_local() {
    removing_last_port_removes_group(&local_api());
}

#[test]
fn test_last_port_removal_deletes_group_remote() {
    removing_last_port_removes_group(&remote_api());
}

#[test]
fn test_duplicate_hook_local() {
    duplicate_hook_is_conflict(&local_api());
}

#[test]
fn test_duplicate_hook_remote() {
    duplicate_hook_is_conflict(&remote_api());
}

#[test]
fn test_chain_order_local() {
    chain_order_round_trips(&local_api());
}

#[test]
fn test_chain_order_remote() {
    chain_order_round_trips(&remote_api());
}

#[test]
fn test_group_exclusivity_local() {
    bound_group_is_exclusive(&local_api());
}

#[test]
fn test_group_exclusivity_remote() {
    bound_group_is_exclusive(&remote_api());
}

#[test]
fn test_hook_removal_local() {
    removed_hook_is_gone(&local_api());
}

#[test]
fn test_hook_removal_remote() {
    removed_hook_is_gone(&remote_api());
}

#[test]
fn test_chain_delete_keeps_groups_local() {
    deleting_chain_keeps_groups(&local_api());
}

#[test]
fn test_chain_delete_keeps_groups_remote() {
    deleting_chain_keeps_groups(&remote_api());
}

#[test]
fn test_repeated_registration_local() {
    repeated_registration_reuses_port_and_group(&local_api());
}

#[test]
fn test_repeated_registration_remote() {
    repeated_registration_reuses_port_and_group(&remote_api());
}
