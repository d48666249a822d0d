mod common;

use axum::http::{Method, StatusCode};
use common::*;
use dex_firehose::structpb;
use serde_json::json;
use tonic::Code;

fn applied(h: &Harness) -> Vec<dex_proto::entropy_v1beta1::ApplyActionRequest> {
    h.resources
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Apply(req) => Some(req),
            _ => None,
        })
        .collect()
}

fn updates(h: &Harness) -> usize {
    h.resources
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Update(_)))
        .count()
}

#[tokio::test]
async fn start_accepts_empty_body() {
    let h = Harness::with_firehose("0.7.0");
    let resp = h.raw(Method::POST, &firehose_uri("/start"), None).await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urn"], URN);

    let reqs = applied(&h);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].action, "start");
    assert_eq!(
        structpb::from_value(reqs[0].params.as_ref().unwrap()).unwrap(),
        json!({})
    );
    assert!(h.alerts.upserts().is_empty());
}

#[tokio::test]
async fn scale_sends_replicas() {
    let h = Harness::with_firehose("0.7.0");
    let (status, _) = h
        .send(Method::POST, &firehose_uri("/scale"), Some(json!({"replicas": 3})))
        .await;

    assert_eq!(status, StatusCode::OK);
    let reqs = applied(&h);
    assert_eq!(reqs[0].action, "scale");
    assert_eq!(
        structpb::from_value(reqs[0].params.as_ref().unwrap()).unwrap(),
        json!({"replicas": 3})
    );
}

#[tokio::test]
async fn negative_replicas_never_reach_the_orchestrator() {
    let h = Harness::with_firehose("0.7.0");
    let (status, body) = h
        .send(Method::POST, &firehose_uri("/scale"), Some(json!({"replicas": -1})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert!(applied(&h).is_empty());
}

#[tokio::test]
async fn reset_to_datetime_requires_a_timestamp() {
    let h = Harness::with_firehose("0.7.0");
    let (status, _) = h
        .send(Method::POST, &firehose_uri("/reset"), Some(json!({"to": "DATETIME"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(applied(&h).is_empty());

    let (status, _) = h
        .send(
            Method::POST,
            &firehose_uri("/reset"),
            Some(json!({"to": "DATETIME", "date_time": "2022-06-01T00:00:00Z"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reqs = applied(&h);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].action, "reset");
}

#[tokio::test]
async fn backend_invalid_argument_is_bad_request_with_cause() {
    let h = Harness::with_firehose("0.7.0");
    *h.resources.apply_error.lock().unwrap() =
        Some((Code::InvalidArgument, "replicas above quota".to_string()));

    let (status, body) = h
        .send(Method::POST, &firehose_uri("/scale"), Some(json!({"replicas": 99})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["cause"], "replicas above quota");
}

#[tokio::test]
async fn unexpected_backend_error_is_internal() {
    let h = Harness::with_firehose("0.7.0");
    *h.resources.apply_error.lock().unwrap() = Some((Code::Unavailable, "down".to_string()));

    let (status, body) = h.send(Method::POST, &firehose_uri("/start"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal_error");
}

#[tokio::test]
async fn upgrade_is_a_no_op_at_latest_version() {
    let h = Harness::with_firehose(LATEST_VERSION);
    let resp = h.raw(Method::POST, &firehose_uri("/upgrade"), None).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(updates(&h), 0);
    assert!(applied(&h).is_empty());
}

#[tokio::test]
async fn upgrade_rewrites_version_exactly_once() {
    let h = Harness::with_firehose("0.7.0");
    let (status, body) = h.send(Method::POST, &firehose_uri("/upgrade"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["configs"]["version"], LATEST_VERSION);
    assert_eq!(body["configs"]["env_vars"]["SINK_TYPE"], "log");
    assert_eq!(updates(&h), 1);

    let (status, _) = h.send(Method::POST, &firehose_uri("/upgrade"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(updates(&h), 1);
}

#[tokio::test]
async fn upgrade_keeps_orchestrator_owned_config_keys() {
    let h = Harness::new();
    let mut res = firehose_resource(URN, "0.7.0", Some(RELEASE_NAME));
    let spec = res.spec.as_mut().unwrap();
    let mut configs = structpb::from_value(spec.configs.as_ref().unwrap()).unwrap();
    configs["image"] = json!("odpf/firehose:0.7.0");
    configs["stopped"] = json!(false);
    spec.configs = Some(structpb::to_struct_value(&configs).unwrap());
    h.resources.insert(res);

    let (status, _) = h.send(Method::POST, &firehose_uri("/upgrade"), None).await;
    assert_eq!(status, StatusCode::OK);

    let calls = h.resources.calls();
    let Some(Call::Update(req)) = calls.last() else {
        panic!("expected an update call, got {calls:?}");
    };
    let sent = req.new_spec.as_ref().unwrap().configs.as_ref().unwrap();
    let sent = structpb::from_value(sent).unwrap();
    assert_eq!(sent["version"], LATEST_VERSION);
    assert_eq!(sent["image"], "odpf/firehose:0.7.0");
    assert_eq!(sent["stopped"], false);
    assert_eq!(sent["env_vars"]["SINK_TYPE"], "log");
}

#[tokio::test]
async fn stop_suppresses_alerts_for_the_release() {
    let h = Harness::with_firehose("0.7.0");
    let (status, _) = h.send(Method::POST, &firehose_uri("/stop"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied(&h)[0].action, "stop");

    let upserts = h.alerts.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].0, PROJECT_SLUG);
    assert_eq!(upserts[0].1.resource, RELEASE_NAME);
    assert!(upserts[0].1.rules.is_empty());
}

#[tokio::test]
async fn stop_without_release_name_fails_after_the_transition() {
    let h = Harness::new();
    h.resources.insert(firehose_resource(URN, "0.7.0", None));

    let (status, body) = h.send(Method::POST, &firehose_uri("/stop"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "unable to parse firehose name");
    assert_eq!(applied(&h).len(), 1);
    assert!(h.alerts.upserts().is_empty());
}

#[tokio::test]
async fn stop_reports_alert_service_failure() {
    let h = Harness::with_firehose("0.7.0");
    *h.alerts.fail_upsert.lock().unwrap() = true;

    let (status, _) = h.send(Method::POST, &firehose_uri("/stop"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(applied(&h).len(), 1);
    assert_eq!(h.alerts.upserts().len(), 1);
}
