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

fn element(id: &str) -> NetworkElement {
    NetworkElement::with_id(id)
}

fn sample_group<S: GraphStore>(api: &RedirectionApi<S>, name: &str) -> String {
    api.register_inspection_port(Some(&InspectionPort::new(
        element(&format!("{name}-in")),
        element(&format!("{name}-out")),
    )))
    .expect("register")
    .parent_id
    .expect("parent")
}

fn empty_member_lists_are_invalid<S: GraphStore>(api: &RedirectionApi<S>) {
    let err = api.register_network_element(&[]).unwrap_err();
    assert_eq!(err.to_string(), "null passed for Port Pair Group member list !");

    let group = sample_group(api, "g");
    let chain = api
        .register_network_element(&[element(&group)])
        .expect("chain")
        .element_id;
    let err = api
        .update_network_element(Some(&element(&chain)), &[])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "null passed for Port Pair Group update member list !"
    );

    let err = api.update_network_element(None, &[element(&group)]).unwrap_err();
    assert_eq!(err.to_string(), "null passed for Service Function Chain Id !");
    let err = api.delete_network_element(None).unwrap_err();
    assert!(matches!(err, RedirectionError::InvalidInput { .. }));
    let err = api.get_network_elements(Some(&NetworkElement::default())).unwrap_err();
    assert!(matches!(err, RedirectionError::InvalidInput { .. }));

    let err = api.register_network_element(&[NetworkElement::default()]).unwrap_err();
    assert_eq!(err.to_string(), "null passed for Port Pair Group Id !");
}

fn unknown_group_is_not_found<S: GraphStore>(api: &RedirectionApi<S>) {
    let group = sample_group(api, "g");
    let err = api
        .register_network_element(&[element(&group), element("ghost")])
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot find Port Pair Group by id: ghost!");
    assert!(api.store().list_chains().expect("chains").is_empty());
    assert!(
        api.lookup()
            .find_chain_containing_group(&group)
            .expect("find")
            .is_none()
    );
}

fn duplicate_group_ids_conflict<S: GraphStore>(api: &RedirectionApi<S>) {
    let group = sample_group(api, "g");
    let err = api
        .register_network_element(&[element(&group), element(&group)])
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        err.to_string(),
        format!("Port Pair Group Id {group} is listed more than once")
    );
    assert!(api.store().list_chains().expect("chains").is_empty());
}

fn update_keeps_own_groups_and_releases_dropped<S: GraphStore>(api: &RedirectionApi<S>) {
    let g1 = sample_group(api, "a");
    let g2 = sample_group(api, "b");
    let g3 = sample_group(api, "c");
    let chain = api
        .register_network_element(&[element(&g1), element(&g2)])
        .expect("chain")
        .element_id;

    let updated = api
        .update_network_element(Some(&element(&chain)), &[element(&g2), element(&g3)])
        .expect("update");
    assert_eq!(updated.port_pair_groups, vec![g2.clone(), g3.clone()]);

    let lookup = api.lookup();
    assert!(lookup.find_chain_containing_group(&g1).expect("find").is_none());
    let bound = lookup
        .find_chain_containing_group(&g3)
        .expect("find")
        .expect("bound");
    assert_eq!(bound.element_id, chain);

    // the released group can join another chain
    let other = api.register_network_element(&[element(&g1)]).expect("other");
    assert_eq!(other.port_pair_groups, vec![g1]);
}

fn unknown_chain_is_not_found<S: GraphStore>(api: &RedirectionApi<S>) {
    let group = sample_group(api, "g");
    let err = api
        .update_network_element(Some(&element("no-chain")), &[element(&group)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot find Service Function Chain by id: no-chain!"
    );
    let err = api.delete_network_element(Some(&element("no-chain"))).unwrap_err();
    assert!(err.is_not_found());
}

fn chain_with_hooks_cannot_be_deleted<S: GraphStore>(api: &RedirectionApi<S>) {
    let group = sample_group(api, "g");
    let chain = api
        .register_network_element(&[element(&group)])
        .expect("chain")
        .element_id;
    let hook = api
        .install_inspection_hook(Some(&element("vm")), Some(&element(&chain)), None, None, None, None)
        .expect("install");

    let err = api.delete_network_element(Some(&element(&chain))).unwrap_err();
    assert!(err.is_conflict());
    let stored = api.lookup().find_chain(&chain).expect("find").expect("chain");
    assert_eq!(stored.port_pair_groups, vec![group]);

    api.remove_inspection_hook(Some(&hook)).expect("remove hook");
    api.delete_network_element(Some(&element(&chain))).expect("delete");
    assert!(api.lookup().find_chain(&chain).expect("find").is_none());
}

#[test]
fn test_empty_member_lists_local() {
    empty_member_lists_are_invalid(&local_api());
}

#[test]
fn test_empty_member_lists_remote() {
    empty_member_lists_are_invalid(&remote_api());
}

#[test]
fn test_unknown_group_local() {
    unknown_group_is_not_found(&local_api());
}

#[test]
fn test_unknown_group_remote() {
    unknown_group_is_not_found(&remote_api());
}

#[test]
fn test_duplicate_group_ids_local() {
    duplicate_group_ids_conflict(&local_api());
}

#[test]
fn test_duplicate_group_ids_remote() {
    duplicate_group_ids_conflict(&remote_api());
}

#[test]
fn test_update_membership_local() {
    update_keeps_own_groups_and_releases_dropped(&local_api());
}

#[test]
fn test_update_membership_remote() {
    update_keeps_own_groups_and_releases_dropped(&remote_api());
}

#[test]
fn test_unknown_chain_local() {
    unknown_chain_is_not_found(&local_api());
}

#[test]
fn test_unknown_chain_remote() {
    unknown_chain_is_not_found(&remote_api());
}

#[test]
fn test_chain_with_hooks_local() {
    chain_with_hooks_cannot_be_deleted(&local_api());
}

#[test]
fn test_chain_with_hooks_remote() {
    chain_with_hooks_cannot_be_deleted(&remote_api());
}

#[test]
fn test_dangling_group_reference_is_reported_as_placeholder() {
    let client = InMemorySfcClient::new();
    let chain_id = client.seed_raw(
        sfcgraph::ResourceKind::PortChain,
        serde_json::json!({
            "name": "seeded-chain",
            "port_pair_groups": ["vanished-group"],
            "flow_classifiers": null,
        }),
    );
    let api = RedirectionApi::new(RemoteGraphStore::new(client));

    let groups = api
        .get_network_elements(Some(&element(&chain_id)))
        .expect("read");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].element_id, "vanished-group");
    assert!(groups[0].port_pairs.is_empty());
    assert_eq!(groups[0].chain_id.as_deref(), Some(chain_id.as_str()));
}
