use proptest::prelude::*;
use resource_framework::error::{ErrorCode, SchemaError};
use resource_framework::mock::MockHandler;
use resource_framework::{
    ActionDef, ApiRequest, ApiVersion, Capabilities, Describe, FieldType, HttpMethod, LinkType,
    ParsedPath, ResourceCollection, ResourceHandler, ResourceKind, ResourceRef, SchemaManager,
    TypeDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// --- Test Kinds ---

macro_rules! plain_kind {
    ($ty:ident, [$($parent:literal),*]) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct $ty {
            name: String,
        }

        impl Describe for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::new(stringify!($ty)).field("name", FieldType::String, "")
            }
        }

        impl ResourceKind for $ty {
            fn parents() -> Vec<String> {
                vec![$($parent.to_string()),*]
            }
        }
    };
}

plain_kind!(Cluster, []);
plain_kind!(Node, ["cluster"]);
plain_kind!(Namespace, ["cluster"]);
plain_kind!(Deployment, ["namespace"]);
plain_kind!(DaemonSet, ["namespace"]);
plain_kind!(StatefulSet, ["namespace"]);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OtherPodInfo {
    name: String,
    numbers: Vec<u32>,
}

impl Describe for OtherPodInfo {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("OtherPodInfo")
            .field("name", FieldType::String, "default=other")
            .field("numbers", FieldType::slice(FieldType::Uint), "default=1|2|3")
    }
}

fn other(name: &str, numbers: &[u32]) -> OtherPodInfo {
    OtherPodInfo {
        name: name.into(),
        numbers: numbers.to_vec(),
    }
}

fn filled() -> OtherPodInfo {
    other("other", &[1, 2, 3])
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Pod {
    name: String,
    count: u32,
    annotations: BTreeMap<String, String>,
    other_info: OtherPodInfo,
    other_info_slice: Vec<OtherPodInfo>,
    other_info_pointer: Option<OtherPodInfo>,
    other_info_pointer_slice: Vec<Option<OtherPodInfo>>,
}

impl Describe for Pod {
    fn describe() -> TypeDescriptor {
        let info = FieldType::struct_of::<OtherPodInfo>;
        TypeDescriptor::new("Pod")
            .field("name", FieldType::String, "required=true")
            .field("count", FieldType::Uint, "default=20")
            .field("annotations", FieldType::string_map(FieldType::String), "")
            .field("otherInfo", info(), "")
            .field("otherInfoSlice", FieldType::slice(info()), "")
            .field("otherInfoPointer", FieldType::ptr(info()), "")
            .field("otherInfoPointerSlice", FieldType::slice(FieldType::ptr(info())), "")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    node_name: String,
}

impl ResourceKind for Pod {
    fn parents() -> Vec<String> {
        vec!["deployment".into(), "daemonset".into(), "statefulset".into()]
    }

    fn actions() -> Vec<ActionDef> {
        vec![ActionDef::with_input::<Location>("move")]
    }

    fn default_resource() -> Option<Self> {
        Some(Pod {
            other_info_slice: vec![OtherPodInfo::default()],
            other_info_pointer: Some(OtherPodInfo::default()),
            other_info_pointer_slice: vec![Some(OtherPodInfo::default())],
            ..Default::default()
        })
    }
}

// --- Helpers ---

const PREFIX: &str = "/apis/testing/v1";
const BASE_URL: &str = "http://127.0.0.1:5555";

fn version() -> ApiVersion {
    ApiVersion::new("testing", "v1")
}

fn handler(caps: Capabilities) -> Arc<dyn ResourceHandler> {
    Arc::new(MockHandler::new(caps))
}

fn create_schema_manager() -> SchemaManager {
    let v = version();
    let mut mgr = SchemaManager::new();
    mgr.register::<Cluster>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Node>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Namespace>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Deployment>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<DaemonSet>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<StatefulSet>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Pod>(&v, handler(Capabilities::all())).unwrap();
    mgr.finalize();
    mgr
}

fn paths(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|p| format!("{}{}", PREFIX, p)).collect()
}

fn link(path: &str) -> String {
    format!("{}{}{}", BASE_URL, PREFIX, path)
}

// --- Routes ---

#[test]
fn test_generate_resource_route() {
    let mgr = create_schema_manager();
    let get_and_post = paths(&[
        "/clusters",
        "/clusters/:cluster_id",
        "/clusters/:cluster_id/nodes",
        "/clusters/:cluster_id/nodes/:node_id",
        "/clusters/:cluster_id/namespaces",
        "/clusters/:cluster_id/namespaces/:namespace_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments/:deployment_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets/:daemonset_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets/:statefulset_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments/:deployment_id/pods",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments/:deployment_id/pods/:pod_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets/:daemonset_id/pods",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets/:daemonset_id/pods/:pod_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets/:statefulset_id/pods",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets/:statefulset_id/pods/:pod_id",
    ]);
    let delete_and_put = paths(&[
        "/clusters/:cluster_id",
        "/clusters/:cluster_id/nodes/:node_id",
        "/clusters/:cluster_id/namespaces/:namespace_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments/:deployment_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets/:daemonset_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets/:statefulset_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/deployments/:deployment_id/pods/:pod_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/statefulsets/:statefulset_id/pods/:pod_id",
        "/clusters/:cluster_id/namespaces/:namespace_id/daemonsets/:daemonset_id/pods/:pod_id",
    ]);

    let routes = mgr.generate_routes();
    assert_eq!(routes.methods().count(), 4);
    for (method, urls) in routes.iter() {
        match method {
            HttpMethod::Get | HttpMethod::Post => assert_eq!(urls, &get_and_post, "{}", method),
            HttpMethod::Put | HttpMethod::Delete => assert_eq!(urls, &delete_and_put, "{}", method),
        }
    }
}

#[test]
fn test_routes_follow_capabilities() {
    let v = version();
    let mut mgr = SchemaManager::new();
    mgr.register::<Cluster>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Node>(&v, handler(Capabilities::GET | Capabilities::LIST)).unwrap();
    mgr.finalize();

    let routes = mgr.generate_routes();
    let get = routes.get(HttpMethod::Get).unwrap();
    assert!(get.contains("/apis/testing/v1/clusters/:cluster_id/nodes"));
    assert!(get.contains("/apis/testing/v1/clusters/:cluster_id/nodes/:node_id"));
    for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
        assert!(routes
            .get(method)
            .unwrap()
            .iter()
            .all(|p| !p.contains("nodes")));
    }
}

// --- Path Parsing ---

#[test]
fn test_create_resource_from_request() {
    let mgr = create_schema_manager();

    let invalid_urls = [
        "/apis/testings/v1/clusters/c1/namespaces/n1/deployments/d1/pods/p1",
        "/apis/testing/v2/clusters/c1/namespaces/n1/deployments/d1/pods/p1",
        "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/p1",
        "/apis/testing/v1/clusters/c1/namespacess/n1/deployments/d1/p1",
        "/apis/testing/v1/clusters/c1/deployments/d1/p1",
        "/apis/testing/v1/clusters/c1/namespacess/deployments/d1/p1",
        "/apis/testing/v1",
        "/apis/testing/v1beta/clusters",
    ];
    for url in invalid_urls {
        let err = mgr
            .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, url))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound, "{}", url);
    }

    let valid_cases: [(&str, &str, &[(&str, &str)]); 6] = [
        (
            "/clusters/c1/namespaces/n1/deployments/d1/pods/p1",
            "p1",
            &[("cluster", "c1"), ("namespace", "n1"), ("deployment", "d1")],
        ),
        (
            "/clusters/c1/namespaces/n1/statefulsets/s1/pods/p2",
            "p2",
            &[("cluster", "c1"), ("namespace", "n1"), ("statefulset", "s1")],
        ),
        (
            "/clusters/c1/namespaces/n2/daemonsets/d1/pods/p3",
            "p3",
            &[("cluster", "c1"), ("namespace", "n2"), ("daemonset", "d1")],
        ),
        ("/clusters/c1/namespaces/n2", "n2", &[("cluster", "c1")]),
        ("/clusters/c1/namespaces", "", &[("cluster", "c1")]),
        ("/clusters/c1", "c1", &[]),
    ];
    for (path, id, parents) in valid_cases {
        let url = format!("{}{}", PREFIX, path);
        let r = mgr
            .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, &url))
            .unwrap();
        assert_eq!(r.id, id, "{}", url);
        let expected: Vec<ResourceRef> = parents.iter().map(|(k, i)| ResourceRef::new(*k, *i)).collect();
        assert_eq!(r.ancestors, expected, "{}", url);
        assert_eq!(r.parent(), expected.last());
        assert!(!r.has_object());
    }
}

#[test]
fn test_parse_path() {
    let mgr = create_schema_manager();
    let parsed = mgr.parse_path("/apis/testing/v1/clusters/c1/nodes/").unwrap();
    assert_eq!(
        parsed,
        ParsedPath {
            version: version(),
            kind: "node".into(),
            id: None,
            ancestors: vec![ResourceRef::new("cluster", "c1")],
        }
    );
    assert!(parsed.is_collection());

    let parsed = mgr.parse_path("/apis/testing/v1/clusters/c1?action=x").unwrap();
    assert_eq!(parsed.id.as_deref(), Some("c1"));
    assert_eq!(parsed.parent(), None);
}

#[test]
fn test_parse_path_rejects_empty_segments() {
    let mgr = create_schema_manager();
    for path in [
        "/apis/testing/v1/clusters//nodes",
        "/apis/testing/v1//clusters",
        "/apis/testing/v1/clusters/c1//",
        "/apis/testing/v1/clusters/c1/nodes//",
    ] {
        let err = mgr.parse_path(path).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound, "{}", path);
    }
    assert!(mgr.parse_path("/apis/testing/v1/clusters/c1/").is_ok());
}

#[test]
fn test_parse_path_with_slash_in_version() {
    let v = ApiVersion::new("zdns.cloud.example", "example/v1");
    let mut mgr = SchemaManager::new();
    mgr.register::<Cluster>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Node>(&v, handler(Capabilities::all())).unwrap();
    mgr.finalize();

    let parsed = mgr
        .parse_path("/apis/zdns.cloud.example/example/v1/clusters/c1/nodes/n1")
        .unwrap();
    assert_eq!(parsed.version, v);
    assert_eq!(parsed.kind, "node");
    assert_eq!(parsed.id.as_deref(), Some("n1"));
}

#[test]
fn test_parse_path_checks_capabilities() {
    let v = version();
    let mut mgr = SchemaManager::new();
    mgr.register::<Cluster>(&v, handler(Capabilities::all())).unwrap();
    mgr.register::<Node>(&v, handler(Capabilities::LIST)).unwrap();
    mgr.register::<Namespace>(&v, handler(Capabilities::GET)).unwrap();
    mgr.finalize();

    assert!(mgr.parse_path("/apis/testing/v1/clusters/c1/nodes").is_ok());
    assert_eq!(
        mgr.parse_path("/apis/testing/v1/clusters/c1/nodes/n1").unwrap_err().code,
        ErrorCode::NotFound
    );
    assert!(mgr.parse_path("/apis/testing/v1/clusters/c1/namespaces/n1").is_ok());
    assert_eq!(
        mgr.parse_path("/apis/testing/v1/clusters/c1/namespaces").unwrap_err().code,
        ErrorCode::NotFound
    );
}

// --- Links ---

#[test]
fn test_add_resource_links() {
    let mgr = create_schema_manager();
    let cases: Vec<(&str, BTreeMap<LinkType, String>)> = vec![
        (
            "/clusters/c1/namespaces/n1/deployments/d1/pods/p1",
            BTreeMap::from([
                (LinkType::SelfLink, link("/clusters/c1/namespaces/n1/deployments/d1/pods/p1")),
                (LinkType::Update, link("/clusters/c1/namespaces/n1/deployments/d1/pods/p1")),
                (LinkType::Remove, link("/clusters/c1/namespaces/n1/deployments/d1/pods/p1")),
                (LinkType::Collection, link("/clusters/c1/namespaces/n1/deployments/d1/pods")),
            ]),
        ),
        (
            "/clusters/c1/namespaces/n1",
            BTreeMap::from([
                (LinkType::SelfLink, link("/clusters/c1/namespaces/n1")),
                (LinkType::Update, link("/clusters/c1/namespaces/n1")),
                (LinkType::Remove, link("/clusters/c1/namespaces/n1")),
                (LinkType::Collection, link("/clusters/c1/namespaces")),
                (
                    LinkType::Child("deployments".into()),
                    link("/clusters/c1/namespaces/n1/deployments"),
                ),
                (
                    LinkType::Child("daemonsets".into()),
                    link("/clusters/c1/namespaces/n1/daemonsets"),
                ),
                (
                    LinkType::Child("statefulsets".into()),
                    link("/clusters/c1/namespaces/n1/statefulsets"),
                ),
            ]),
        ),
    ];

    for (path, links) in cases {
        let url = format!("{}{}", PREFIX, path);
        let mut r = mgr
            .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, &url))
            .unwrap();
        mgr.add_links_to_resource(&mut r, BASE_URL).unwrap();
        assert_eq!(r.links, links, "{}", url);
    }
}

#[test]
fn test_links_follow_capabilities() {
    let v = version();
    let mut mgr = SchemaManager::new();
    mgr.register::<Cluster>(&v, handler(Capabilities::GET)).unwrap();
    mgr.register::<Node>(&v, handler(Capabilities::GET | Capabilities::LIST)).unwrap();
    mgr.register::<Namespace>(&v, handler(Capabilities::GET)).unwrap();
    mgr.finalize();

    let mut r = mgr
        .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, "/apis/testing/v1/clusters/c1"))
        .unwrap();
    mgr.add_links_to_resource(&mut r, BASE_URL).unwrap();
    assert_eq!(
        r.links,
        BTreeMap::from([
            (LinkType::SelfLink, link("/clusters/c1")),
            (LinkType::Child("nodes".into()), link("/clusters/c1/nodes")),
        ])
    );
}

#[test]
fn test_add_resource_collection_link() {
    let mgr = create_schema_manager();
    let cases = [
        ("/clusters/c1/namespaces/n1/deployments/d1/pods", "pod", None),
        ("/clusters/c1/namespaces/n1/deployments", "deploy", Some("pods")),
    ];

    for (path, id_prefix, child) in cases {
        let url = format!("{}{}", PREFIX, path);
        let r = mgr
            .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, &url))
            .unwrap();
        let children = (0..2).map(|i| resource_framework::Resource::new("", format!("{}{}", id_prefix, i)));
        let mut coll = ResourceCollection::under(&r, children);
        mgr.add_links_to_resource_collection(&mut coll, BASE_URL).unwrap();

        assert_eq!(coll.links, BTreeMap::from([(LinkType::SelfLink, link(path))]));
        assert_eq!(coll.len(), 2);
        for (i, item) in coll.resources.iter().enumerate() {
            let self_link = link(&format!("{}/{}{}", path, id_prefix, i));
            let mut expected = BTreeMap::from([
                (LinkType::SelfLink, self_link.clone()),
                (LinkType::Update, self_link.clone()),
                (LinkType::Remove, self_link.clone()),
                (LinkType::Collection, link(path)),
            ]);
            if let Some(child) = child {
                expected.insert(LinkType::Child(child.into()), format!("{}/{}", self_link, child));
            }
            assert_eq!(item.links, expected);
        }
    }
}

// --- Request Bodies ---

#[test]
fn test_fill_default_value() {
    let mgr = create_schema_manager();
    let url = "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/pods/";
    let cases = vec![
        (
            r#"{"name": "p1"}"#,
            Pod {
                name: "p1".into(),
                count: 20,
                other_info: filled(),
                other_info_slice: vec![filled()],
                other_info_pointer: Some(filled()),
                other_info_pointer_slice: vec![Some(filled())],
                ..Default::default()
            },
        ),
        (
            r#"{"name": "p2", "count": 30, "otherInfo": {"name": "other1"}}"#,
            Pod {
                name: "p2".into(),
                count: 30,
                other_info: other("other1", &[1, 2, 3]),
                other_info_slice: vec![filled()],
                other_info_pointer: Some(filled()),
                other_info_pointer_slice: vec![Some(filled())],
                ..Default::default()
            },
        ),
        (
            r#"{"name": "p3", "count": 30, "otherInfoPointer": {"name": "other1", "numbers": []}}"#,
            Pod {
                name: "p3".into(),
                count: 30,
                other_info: filled(),
                other_info_slice: vec![filled()],
                other_info_pointer: Some(other("other1", &[])),
                other_info_pointer_slice: vec![Some(filled())],
                ..Default::default()
            },
        ),
        (
            r#"{"name": "p4", "count": 30, "otherInfoSlice": [{"name": "other1", "numbers": [1, 3]}]}"#,
            Pod {
                name: "p4".into(),
                count: 30,
                other_info: filled(),
                other_info_slice: vec![other("other1", &[1, 3])],
                other_info_pointer: Some(filled()),
                other_info_pointer_slice: vec![Some(filled())],
                ..Default::default()
            },
        ),
        (
            r#"{"name": "p5", "count": 30, "otherInfoPointerSlice": [{"name": "other1", "numbers": [1, 3]}]}"#,
            Pod {
                name: "p5".into(),
                count: 30,
                other_info: filled(),
                other_info_slice: vec![filled()],
                other_info_pointer: Some(filled()),
                other_info_pointer_slice: vec![Some(other("other1", &[1, 3]))],
                ..Default::default()
            },
        ),
    ];

    for (body, expected) in cases {
        let req = ApiRequest::new(HttpMethod::Post, url).with_body(body);
        let r = mgr.create_resource_from_request(&req).unwrap();
        assert_eq!(r.kind, "pod");
        assert_eq!(r.id, "");
        assert_eq!(r.object::<Pod>(), Some(&expected), "{}", body);
    }
}

#[test]
fn test_request_body_errors() {
    let mgr = create_schema_manager();
    let pods = "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/pods";
    let cases = [
        (HttpMethod::Post, pods.to_string(), "", ErrorCode::InvalidFormat),
        (HttpMethod::Post, pods.to_string(), "{not json", ErrorCode::InvalidFormat),
        (HttpMethod::Post, pods.to_string(), "[1, 2]", ErrorCode::InvalidFormat),
        (HttpMethod::Post, pods.to_string(), r#"{"count": 1}"#, ErrorCode::MissingRequired),
        (HttpMethod::Post, pods.to_string(), r#"{"name": ""}"#, ErrorCode::MissingRequired),
        (HttpMethod::Post, pods.to_string(), r#"{"name": "p", "count": "many"}"#, ErrorCode::InvalidFormat),
        (HttpMethod::Put, format!("{}/p1", pods), r#"{"count": 1}"#, ErrorCode::MissingRequired),
        (HttpMethod::Post, format!("{}/p1", pods), r#"{"name": "p"}"#, ErrorCode::InvalidAction),
    ];
    for (method, url, body, code) in cases {
        let req = ApiRequest::new(method, &url).with_body(body);
        let err = mgr.create_resource_from_request(&req).unwrap_err();
        assert_eq!(err.code, code, "{} {} {}", method, url, body);
    }

    let update = ApiRequest::new(HttpMethod::Put, &format!("{}/p1", pods)).with_body(r#"{"name": "p1"}"#);
    let r = mgr.create_resource_from_request(&update).unwrap();
    assert_eq!(r.id, "p1");
    assert_eq!(r.object::<Pod>().map(|p| p.count), Some(20));
}

#[test]
fn test_action() {
    let mgr = create_schema_manager();
    let url = "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/pods/p1?action=move";
    let req = ApiRequest::new(HttpMethod::Post, url).with_body(r#"{"nodeName": "n1"}"#);
    let r = mgr.create_resource_from_request(&req).unwrap();
    assert_eq!(r.kind, "pod");
    assert_eq!(r.id, "p1");
    assert!(!r.has_object());
    let action = r.action.as_ref().unwrap();
    assert_eq!(action.name, "move");
    assert_eq!(action.input::<Location>().unwrap().node_name, "n1");

    let unknown = "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/pods/p1?action=me";
    let err = mgr
        .create_resource_from_request(&ApiRequest::new(HttpMethod::Post, unknown))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAction);

    let on_collection = "/apis/testing/v1/clusters/c1/namespaces/n1/deployments/d1/pods?action=move";
    let err = mgr
        .create_resource_from_request(&ApiRequest::new(HttpMethod::Post, on_collection))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAction);

    let err = mgr
        .create_resource_from_request(&ApiRequest::new(HttpMethod::Get, url))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAction);
}

// --- Registration ---

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClusterV2 {
    name: String,
}

impl Describe for ClusterV2 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("ClusterV2")
    }
}

impl ResourceKind for ClusterV2 {
    fn plural_name() -> String {
        "clusters".into()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Chatty {
    name: String,
}

impl Describe for Chatty {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("Chatty")
    }
}

impl ResourceKind for Chatty {
    fn actions() -> Vec<ActionDef> {
        vec![ActionDef::new("ping"), ActionDef::new("ping")]
    }
}

#[test]
fn test_registration_errors() {
    let v = version();
    let mut mgr = SchemaManager::new();

    assert_eq!(
        mgr.register::<Pod>(&v, handler(Capabilities::all())),
        Err(SchemaError::UnknownParent {
            kind: "pod".into(),
            parent: "deployment".into()
        })
    );
    assert_eq!(
        mgr.register::<Cluster>(&v, handler(Capabilities::empty())),
        Err(SchemaError::NoCapabilities("cluster".into()))
    );

    mgr.register::<Cluster>(&v, handler(Capabilities::all())).unwrap();
    assert!(matches!(
        mgr.register::<Cluster>(&v, handler(Capabilities::all())),
        Err(SchemaError::DuplicateKind { .. })
    ));
    assert_eq!(
        mgr.register::<ClusterV2>(&v, handler(Capabilities::all())),
        Err(SchemaError::DuplicateCollection {
            collection: "clusters".into(),
            parent: "root".into()
        })
    );
    assert!(matches!(
        mgr.register::<Chatty>(&v, handler(Capabilities::all())),
        Err(SchemaError::DuplicateAction { .. })
    ));

    // the same kind is independent in another version
    let v2 = ApiVersion::new("testing", "v2");
    mgr.register::<Cluster>(&v2, handler(Capabilities::all())).unwrap();
    assert_eq!(mgr.versions().count(), 2);

    mgr.finalize();
    assert!(mgr.is_finalized());
    assert_eq!(
        mgr.register::<Node>(&v, handler(Capabilities::all())),
        Err(SchemaError::Finalized("node".into()))
    );
    assert_eq!(mgr.kind_names(&v), vec!["cluster"]);
}

#[test]
fn test_kind_lookup() {
    let mgr = create_schema_manager();
    let v = version();
    assert_eq!(mgr.capabilities(&v, "pod"), Some(Capabilities::all()));
    assert!(mgr.handler(&v, "pod").is_some());
    assert!(mgr.field_tree(&v, "pod").is_some());
    assert!(mgr.field_tree(&v, "cluster").is_none());
    assert!(mgr.handler(&ApiVersion::new("testing", "v2"), "pod").is_none());
}

// --- Properties ---

fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9][a-z0-9-]{0,10}", 4)
}

proptest! {
    /// Every generated route, filled with ids, parses back to its kind and parents
    #[test]
    fn generated_routes_parse_back(ids in arb_ids()) {
        let mgr = create_schema_manager();
        let routes = mgr.generate_routes();
        for pattern in routes.get(HttpMethod::Get).unwrap() {
            let rest = pattern.strip_prefix(PREFIX).unwrap();
            let mut url = PREFIX.to_string();
            let mut refs = Vec::new();
            let mut last_collection = "";
            let mut next_id = ids.iter();
            for segment in rest.split('/').filter(|s| !s.is_empty()) {
                url.push('/');
                match segment.strip_prefix(':').and_then(|s| s.strip_suffix("_id")) {
                    Some(kind) => {
                        let id = next_id.next().unwrap();
                        url.push_str(id);
                        refs.push(ResourceRef::new(kind, id.clone()));
                    }
                    None => {
                        url.push_str(segment);
                        last_collection = segment;
                    }
                }
            }

            let parsed = mgr.parse_path(&url).unwrap();
            if pattern.ends_with("_id") {
                let own = refs.pop().unwrap();
                prop_assert_eq!(&parsed.kind, &own.kind);
                prop_assert_eq!(parsed.id.as_deref(), Some(own.id.as_str()));
            } else {
                prop_assert_eq!(parsed.kind.clone() + "s", last_collection);
                prop_assert_eq!(parsed.id, None);
            }
            prop_assert_eq!(parsed.ancestors, refs);
        }
    }
}
